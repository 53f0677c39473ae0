use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::game::constants::ai::{THREAT_RANGE_FACTOR, WANDER_CHANCE, WANDER_SPREAD};
use crate::game::spatial::SpatialGrid;
use crate::game::state::{AgentId, Snake, World};
use crate::util::angle::normalize_angle;
use crate::util::vec2::Vec2;

/// Outcome of one controller evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiDecision {
    pub desired_heading: f32,
    pub boosting: bool,
    pub behavior: AiBehavior,
}

/// What the controller reacted to this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiBehavior {
    /// Running from a heavier agent
    Flee,
    /// Heading for the nearest food
    Seek,
    /// Nothing in sight
    Wander,
}

/// Head and mass of a live agent, as seen by the controller
#[derive(Debug, Clone, Copy)]
pub struct Presence {
    pub id: AgentId,
    pub head: Vec2,
    pub mass: f32,
}

/// Read-only view of the world shared by every controller in a pass
pub struct Surroundings<'a> {
    pub food_grid: &'a SpatialGrid,
    /// Live agents in world iteration order; "first threat found" follows this order
    pub agents: &'a [Presence],
}

impl<'a> Surroundings<'a> {
    pub fn new(food_grid: &'a SpatialGrid, agents: &'a [Presence]) -> Self {
        Self { food_grid, agents }
    }
}

/// Snapshot the live agents for a controller pass
pub fn presences<'a>(agents: impl Iterator<Item = &'a Snake>) -> Vec<Presence> {
    agents
        .filter(|s| s.is_alive())
        .filter_map(|s| {
            s.head_position().map(|head| Presence {
                id: s.id,
                head,
                mass: s.mass,
            })
        })
        .collect()
}

/// Memoryless controller: re-decides from scratch every frame
///
/// Threats inside 0.7 x vision override food; with neither in sight the
/// heading drifts by an occasional small random nudge.
pub fn decide<R: Rng + ?Sized>(
    snake: &Snake,
    surroundings: &Surroundings<'_>,
    vision_range: f32,
    rng: &mut R,
) -> AiDecision {
    let Some(head) = snake.head_position() else {
        return AiDecision {
            desired_heading: snake.desired_heading,
            boosting: false,
            behavior: AiBehavior::Wander,
        };
    };

    let threat_range = vision_range * THREAT_RANGE_FACTOR;
    let threat_range_sq = threat_range * threat_range;
    let threat = surroundings.agents.iter().find(|other| {
        other.id != snake.id
            && other.mass > snake.mass
            && other.head.distance_sq_to(head) < threat_range_sq
    });

    if let Some(threat) = threat {
        let away = threat.head.mirrored_through(head);
        return AiDecision {
            desired_heading: (away - head).angle(),
            boosting: true,
            behavior: AiBehavior::Flee,
        };
    }

    if let Some(food) = surroundings.food_grid.nearest_within(head, vision_range) {
        return AiDecision {
            desired_heading: (food.position - head).angle(),
            boosting: false,
            behavior: AiBehavior::Seek,
        };
    }

    let mut desired_heading = snake.desired_heading;
    if rng.gen_bool(WANDER_CHANCE) {
        desired_heading = normalize_angle(desired_heading + (rng.gen::<f32>() - 0.5) * WANDER_SPREAD);
    }
    AiDecision {
        desired_heading,
        boosting: false,
        behavior: AiBehavior::Wander,
    }
}

/// Run the controller for every live autonomous agent
/// Decisions are computed in parallel against a frozen view, then applied sequentially
pub fn update(world: &mut World) {
    // One seed per bot, drawn in world order so a seeded run replays exactly
    let bot_ids: Vec<AgentId> = world
        .agents
        .values()
        .filter(|s| s.is_alive() && s.is_autonomous())
        .map(|s| s.id)
        .collect();
    if bot_ids.is_empty() {
        return;
    }
    let jobs: Vec<(AgentId, u64)> = bot_ids
        .into_iter()
        .map(|id| (id, world.rng.gen::<u64>()))
        .collect();

    let food_grid = SpatialGrid::from_foods(&world.foods);
    let agents = presences(world.agents.values());
    let surroundings = Surroundings::new(&food_grid, &agents);
    let vision_range = world.vision_range;

    let decisions: Vec<(AgentId, AiDecision)> = jobs
        .into_par_iter()
        .filter_map(|(id, seed)| {
            let snake = world.agents.get(&id)?;
            let mut rng = StdRng::seed_from_u64(seed);
            Some((id, decide(snake, &surroundings, vision_range, &mut rng)))
        })
        .collect();

    for (id, decision) in decisions {
        if let Some(snake) = world.agents.get_mut(&id) {
            snake.desired_heading = decision.desired_heading;
            snake.boosting = decision.boosting;
        }
    }
}
