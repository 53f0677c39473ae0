//! Simulation state definitions
//!
//! Contains the agents ("snakes"), food items and the world that owns them.

use std::fmt;

use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::game::camera::Camera;
use crate::util::vec2::Vec2;

/// Stable agent identifier for one life of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl AgentId {
    /// Reserved id of the player-controlled agent (reused across respawns)
    pub const PLAYER: AgentId = AgentId(0);

    #[inline]
    pub fn is_player(&self) -> bool {
        *self == Self::PLAYER
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_player() {
            write!(f, "player")
        } else {
            write!(f, "bot#{}", self.0)
        }
    }
}

/// Food identifier
pub type FoodId = u64;

/// Agent storage; Fx hashing keeps iteration order reproducible for a given history
pub type AgentMap = HashMap<AgentId, Snake, FxBuildHasher>;

/// Who decides an agent's heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    /// Heading and boost come from the latched external input
    Player,
    /// Heading and boost come from the AI controller
    Autonomous,
}

/// One body link; index 0 of a chain is the head
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub position: Vec2,
    pub radius: f32,
}

impl Segment {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self { position, radius }
    }
}

/// A simulated snake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snake {
    // === Hot fields (touched every step) ===
    /// Body chain, head first
    pub segments: Vec<Segment>,
    /// Current heading (radians)
    pub heading: f32,
    /// Heading the agent is turning toward
    pub desired_heading: f32,
    /// Base speed in world units per frame
    pub speed: f32,
    /// Drives size, chain length and score economy
    pub mass: f32,
    pub boosting: bool,
    pub dead: bool,

    // === Warm fields (collisions/scoring) ===
    pub score: u32,
    pub kills: u32,
    pub controller: Controller,

    // === Cold fields (display only) ===
    pub id: AgentId,
    pub username: String,
    pub color: String,
    pub skin: String,
}

impl Snake {
    #[inline]
    pub fn head(&self) -> Option<&Segment> {
        self.segments.first()
    }

    #[inline]
    pub fn head_position(&self) -> Option<Vec2> {
        self.segments.first().map(|s| s.position)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    #[inline]
    pub fn is_autonomous(&self) -> bool {
        self.controller == Controller::Autonomous
    }

    #[inline]
    pub fn is_player(&self) -> bool {
        self.controller == Controller::Player
    }
}

/// Stationary food item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: FoodId,
    pub position: Vec2,
    pub radius: f32,
    pub color: String,
    pub value: f32,
}

/// The simulated arena
pub struct World {
    pub tick: u64,
    pub map_width: f32,
    pub map_height: f32,
    /// Food count restored after every step
    pub food_target: usize,
    /// Autonomous agent count restored after every step
    pub bot_count: usize,
    /// AI sensing radius
    pub vision_range: f32,
    pub agents: AgentMap,
    pub foods: Vec<Food>,
    pub camera: Camera,
    /// Every random draw of the simulation goes through this
    pub rng: StdRng,
    next_entity_id: u64,
}

impl World {
    /// Empty world sized and seeded from config
    pub fn new(config: &SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            tick: 0,
            map_width: config.map_width,
            map_height: config.map_height,
            food_target: config.food_target,
            bot_count: config.bot_count,
            vision_range: config.vision_range,
            agents: AgentMap::default(),
            foods: Vec::with_capacity(config.food_target),
            camera: Camera::new(config.min_zoom, config.max_zoom),
            rng,
            // 0 is reserved for the player
            next_entity_id: 1,
        }
    }

    /// Generate a new unique entity ID (shared by bots and food)
    pub fn next_entity_id(&mut self) -> u64 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    pub fn next_agent_id(&mut self) -> AgentId {
        AgentId(self.next_entity_id())
    }

    pub fn get_agent(&self, id: AgentId) -> Option<&Snake> {
        self.agents.get(&id)
    }

    pub fn get_agent_mut(&mut self, id: AgentId) -> Option<&mut Snake> {
        self.agents.get_mut(&id)
    }

    pub fn player(&self) -> Option<&Snake> {
        self.agents.get(&AgentId::PLAYER)
    }

    pub fn player_mut(&mut self) -> Option<&mut Snake> {
        self.agents.get_mut(&AgentId::PLAYER)
    }

    /// Insert or replace an agent
    pub fn add_agent(&mut self, snake: Snake) {
        self.agents.insert(snake.id, snake);
    }

    pub fn remove_agent(&mut self, id: AgentId) -> Option<Snake> {
        self.agents.remove(&id)
    }

    pub fn alive_agents(&self) -> impl Iterator<Item = &Snake> {
        self.agents.values().filter(|s| s.is_alive())
    }

    pub fn alive_count(&self) -> usize {
        self.alive_agents().count()
    }

    /// Autonomous agents currently in the world, dead or alive
    pub fn autonomous_count(&self) -> usize {
        self.agents.values().filter(|s| s.is_autonomous()).count()
    }

    /// Set an agent's desired heading; unknown ids are ignored
    pub fn set_desired_heading(&mut self, id: AgentId, angle: f32) -> bool {
        match self.agents.get_mut(&id) {
            Some(snake) if angle.is_finite() => {
                snake.desired_heading = angle;
                true
            }
            _ => false,
        }
    }

    /// Set an agent's boost intent; unknown ids are ignored
    pub fn set_boost_intent(&mut self, id: AgentId, boosting: bool) -> bool {
        match self.agents.get_mut(&id) {
            Some(snake) => {
                snake.boosting = boosting;
                true
            }
            None => false,
        }
    }

    pub fn add_food(&mut self, food: Food) {
        self.foods.push(food);
    }

    /// Whether a point lies inside [0, width] x [0, height]
    pub fn in_bounds(&self, position: Vec2) -> bool {
        position.x >= 0.0
            && position.x <= self.map_width
            && position.y >= 0.0
            && position.y <= self.map_height
    }

    pub fn map_center(&self) -> Vec2 {
        Vec2::new(self.map_width * 0.5, self.map_height * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_snake(id: AgentId, controller: Controller) -> Snake {
        Snake {
            segments: vec![Segment::new(Vec2::new(10.0, 10.0), 8.0)],
            heading: 0.0,
            desired_heading: 0.0,
            speed: 3.0,
            mass: 100.0,
            boosting: false,
            dead: false,
            score: 0,
            kills: 0,
            controller,
            id,
            username: "Test".to_string(),
            color: "#ffffff".to_string(),
            skin: "default".to_string(),
        }
    }

    fn test_world() -> World {
        World::new(&SimConfig {
            seed: Some(7),
            ..SimConfig::default()
        })
    }

    #[test]
    fn test_entity_ids_skip_player_slot() {
        let mut world = test_world();
        let first = world.next_agent_id();
        let second = world.next_entity_id();
        assert_ne!(first, AgentId::PLAYER);
        assert_eq!(first, AgentId(1));
        assert_eq!(second, 2);
    }

    #[test]
    fn test_player_lookup() {
        let mut world = test_world();
        assert!(world.player().is_none());
        world.add_agent(test_snake(AgentId::PLAYER, Controller::Player));
        assert!(world.player().is_some());
        assert!(world.player().unwrap().is_player());
    }

    #[test]
    fn test_set_desired_heading_unknown_id_is_noop() {
        let mut world = test_world();
        assert!(!world.set_desired_heading(AgentId(99), 1.0));
        assert!(!world.set_boost_intent(AgentId(99), true));
    }

    #[test]
    fn test_set_desired_heading_rejects_nan() {
        let mut world = test_world();
        world.add_agent(test_snake(AgentId::PLAYER, Controller::Player));
        assert!(!world.set_desired_heading(AgentId::PLAYER, f32::NAN));
        assert!(world.set_desired_heading(AgentId::PLAYER, 1.5));
        assert_eq!(world.player().unwrap().desired_heading, 1.5);
    }

    #[test]
    fn test_alive_and_autonomous_counts() {
        let mut world = test_world();
        world.add_agent(test_snake(AgentId::PLAYER, Controller::Player));
        let mut bot = test_snake(AgentId(5), Controller::Autonomous);
        bot.dead = true;
        world.add_agent(bot);
        world.add_agent(test_snake(AgentId(6), Controller::Autonomous));

        assert_eq!(world.alive_count(), 2);
        assert_eq!(world.autonomous_count(), 2);
    }

    #[test]
    fn test_in_bounds_is_inclusive() {
        let world = test_world();
        assert!(world.in_bounds(Vec2::new(0.0, 0.0)));
        assert!(world.in_bounds(Vec2::new(5000.0, 5000.0)));
        assert!(!world.in_bounds(Vec2::new(-0.1, 10.0)));
        assert!(!world.in_bounds(Vec2::new(10.0, 5000.1)));
    }

    #[test]
    fn test_agent_id_display() {
        assert_eq!(AgentId::PLAYER.to_string(), "player");
        assert_eq!(AgentId(12).to_string(), "bot#12");
    }
}
