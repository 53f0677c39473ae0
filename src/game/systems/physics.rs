use rayon::prelude::*;

use crate::game::constants::{body, boost, head_radius, movement, target_segment_count};
use crate::game::state::{Segment, Snake, World};
use crate::util::angle::{lerp_angle, normalize_angle};
use crate::util::vec2::Vec2;

/// Advance every live agent by `dt` frames
/// Uses rayon for parallel iteration; agents never read each other here
pub fn update(world: &mut World, dt: f32) {
    world.agents.par_values_mut().for_each(|snake| {
        if snake.is_alive() {
            advance(snake, dt);
        }
    });
}

/// Boost only engages while the agent can afford it
#[inline]
pub fn boost_active(snake: &Snake) -> bool {
    snake.boosting && snake.mass > boost::MIN_MASS
}

/// One locomotion step for a single agent
///
/// Order matters: turn, pay for boost, move the head, grow or shrink the chain,
/// re-taper radii, then drag the body behind the head.
pub fn advance(snake: &mut Snake, dt: f32) {
    if snake.dead {
        return;
    }
    let Some(old_head) = snake.head().copied() else {
        return;
    };

    // Turn toward the desired heading, bounded per frame
    snake.heading = normalize_angle(lerp_angle(
        snake.heading,
        snake.desired_heading,
        movement::TURN_RATE * dt,
    ));

    let mut speed = snake.speed;
    if boost_active(snake) {
        speed *= boost::SPEED_FACTOR;
        snake.mass = (snake.mass - boost::MASS_DRAIN * dt).max(body::MIN_MASS);
        snake.score = snake.score.saturating_sub(boost::SCORE_PENALTY);
    }

    let new_head = old_head.position + Vec2::from_angle(snake.heading) * (speed * dt);
    snake.segments.insert(0, Segment::new(new_head, old_head.radius));

    let target_len = target_segment_count(snake.mass);
    snake.segments.truncate(target_len);

    retaper(snake);
    relax_spacing(&mut snake.segments);
}

/// Recompute every radius from mass, thinning linearly toward the tail
pub fn retaper(snake: &mut Snake) {
    let head = head_radius(snake.mass);
    let len = snake.segments.len() as f32;
    for (i, segment) in snake.segments.iter_mut().enumerate() {
        segment.radius = head * (1.0 - body::TAPER * i as f32 / len);
    }
}

/// Single head-to-tail pass pulling each segment toward its predecessor
pub fn relax_spacing(segments: &mut [Segment]) {
    for i in 1..segments.len() {
        let prev = segments[i - 1];
        let current = &mut segments[i];

        let target = (prev.radius + current.radius) * body::SPACING_FACTOR;
        let offset = current.position - prev.position;
        let dist = offset.length();

        // Coincident segments have no pull direction
        if dist > target && dist > f32::EPSILON {
            current.position = prev.position + offset * (target / dist);
        }
    }
}
