//! Entity factory
//!
//! Builds fresh agents and food with valid initial invariants. All randomness is
//! drawn from the caller's RNG so a seeded world replays identically.

use std::f32::consts::TAU;

use rand::Rng;

use crate::game::constants::{ai, body, food, movement, world};
use crate::game::state::{AgentId, Controller, Food, FoodId, Segment, Snake};
use crate::util::vec2::Vec2;

/// Build an agent as a straight chain trailing behind `position` along -x.
///
/// Autonomous agents get a random chain length, speed and heading; the player
/// always starts with the same body facing +x.
pub fn create_agent<R: Rng + ?Sized>(
    id: AgentId,
    username: impl Into<String>,
    position: Vec2,
    color: impl Into<String>,
    skin: impl Into<String>,
    controller: Controller,
    rng: &mut R,
) -> Snake {
    let (segment_count, speed, heading, desired_heading) = match controller {
        Controller::Player => (body::PLAYER_SEGMENTS, movement::PLAYER_SPEED, 0.0, 0.0),
        Controller::Autonomous => (
            rng.gen_range(body::BOT_SEGMENTS_MIN..=body::BOT_SEGMENTS_MAX),
            rng.gen_range(movement::BOT_SPEED_MIN..movement::BOT_SPEED_MAX),
            rng.gen_range(0.0..TAU),
            rng.gen_range(0.0..TAU),
        ),
    };

    let spacing = body::INITIAL_RADIUS * 2.0;
    let segments = (0..segment_count)
        .map(|i| {
            Segment::new(
                Vec2::new(position.x - i as f32 * spacing, position.y),
                body::INITIAL_RADIUS,
            )
        })
        .collect();

    Snake {
        segments,
        heading,
        desired_heading,
        speed,
        mass: segment_count as f32 * body::MASS_PER_INITIAL_SEGMENT,
        boosting: false,
        dead: false,
        score: 0,
        kills: 0,
        controller,
        id,
        username: username.into(),
        color: color.into(),
        skin: skin.into(),
    }
}

/// Build the player agent under the reserved id
pub fn create_player<R: Rng + ?Sized>(
    username: impl Into<String>,
    position: Vec2,
    color: impl Into<String>,
    skin: impl Into<String>,
    rng: &mut R,
) -> Snake {
    create_agent(
        AgentId::PLAYER,
        username,
        position,
        color,
        skin,
        Controller::Player,
        rng,
    )
}

/// Build a bot at a random point of the map.
///
/// `name_index` picks from the bot name list (wrapping).
pub fn create_bot<R: Rng + ?Sized>(
    id: AgentId,
    map_width: f32,
    map_height: f32,
    name_index: usize,
    rng: &mut R,
) -> Snake {
    let position = random_point(map_width, map_height, rng);
    let name = ai::NAMES[name_index % ai::NAMES.len()];
    let color = ai::COLORS[rng.gen_range(0..ai::COLORS.len())];

    create_agent(
        id,
        name,
        position,
        color,
        world::DEFAULT_SKIN,
        Controller::Autonomous,
        rng,
    )
}

/// Random food item anywhere in the map
pub fn create_food<R: Rng + ?Sized>(
    id: FoodId,
    map_width: f32,
    map_height: f32,
    rng: &mut R,
) -> Food {
    let position = random_point(map_width, map_height, rng);
    let radius = rng.gen_range(food::RADIUS_MIN..food::RADIUS_MAX);
    let color = food::PALETTE[rng.gen_range(0..food::PALETTE.len())];

    Food {
        id,
        position,
        radius,
        color: color.to_string(),
        value: food::VALUE,
    }
}

/// Food dropped near a body segment of a dead agent
pub fn create_death_food<R: Rng + ?Sized>(
    id: FoodId,
    around: Vec2,
    color: &str,
    rng: &mut R,
) -> Food {
    let jitter = Vec2::new(
        rng.gen_range(-0.5..0.5) * food::DEATH_JITTER,
        rng.gen_range(-0.5..0.5) * food::DEATH_JITTER,
    );

    Food {
        id,
        position: around + jitter,
        radius: food::DEATH_RADIUS,
        color: color.to_string(),
        value: food::DEATH_VALUE,
    }
}

/// Player spawn point: near the map centre
pub fn player_spawn_position<R: Rng + ?Sized>(
    map_width: f32,
    map_height: f32,
    rng: &mut R,
) -> Vec2 {
    let spread = world::PLAYER_SPAWN_SPREAD;
    Vec2::new(
        map_width * 0.5 + rng.gen_range(-0.5..0.5) * spread,
        map_height * 0.5 + rng.gen_range(-0.5..0.5) * spread,
    )
}

fn random_point<R: Rng + ?Sized>(map_width: f32, map_height: f32, rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.gen::<f32>() * map_width,
        rng.gen::<f32>() * map_height,
    )
}
