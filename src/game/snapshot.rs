//! Read-only per-frame view for renderers and HUDs

use serde::Serialize;

use crate::game::camera::Camera;
use crate::game::state::{AgentId, Food, Segment, Snake, World};

/// Display fields of one agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    pub id: AgentId,
    pub username: String,
    pub color: String,
    pub skin: String,
    pub segments: Vec<Segment>,
    pub heading: f32,
    pub mass: f32,
    pub score: u32,
    pub kills: u32,
    pub boosting: bool,
    pub dead: bool,
    pub autonomous: bool,
}

impl From<&Snake> for AgentView {
    fn from(snake: &Snake) -> Self {
        Self {
            id: snake.id,
            username: snake.username.clone(),
            color: snake.color.clone(),
            skin: snake.skin.clone(),
            segments: snake.segments.clone(),
            heading: snake.heading,
            mass: snake.mass,
            score: snake.score,
            kills: snake.kills,
            boosting: snake.boosting,
            dead: snake.dead,
            autonomous: snake.is_autonomous(),
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub map_width: f32,
    pub map_height: f32,
    pub camera: Camera,
    /// Present while the player entry exists (alive or awaiting respawn)
    pub player_id: Option<AgentId>,
    /// Sorted by id
    pub agents: Vec<AgentView>,
    pub foods: Vec<Food>,
}

impl WorldSnapshot {
    pub fn capture(world: &World) -> Self {
        let mut agents: Vec<AgentView> = world.agents.values().map(AgentView::from).collect();
        agents.sort_by_key(|a| a.id);

        Self {
            tick: world.tick,
            map_width: world.map_width,
            map_height: world.map_height,
            camera: world.camera,
            player_id: world.player().map(|p| p.id),
            agents,
            foods: world.foods.clone(),
        }
    }

    pub fn player(&self) -> Option<&AgentView> {
        let id = self.player_id?;
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
