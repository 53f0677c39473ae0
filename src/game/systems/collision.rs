use smallvec::SmallVec;

use crate::game::constants::{collision, food};
use crate::game::events::DeathCause;
use crate::game::spawn::create_death_food;
use crate::game::state::{AgentId, Snake, World};
use crate::game::systems::population::{self, Replacements};
use crate::util::vec2::Vec2;

/// One death resolved during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathRecord {
    pub id: AgentId,
    pub cause: DeathCause,
}

/// What a resolve pass changed
#[derive(Debug, Clone, Default)]
pub struct ResolveReport {
    pub food_eaten: usize,
    pub food_dropped: usize,
    pub food_spawned: usize,
    pub deaths: SmallVec<[DeathRecord; 4]>,
    pub replacements: Replacements,
}

/// Resolve consumption, collisions and bounds for every live agent,
/// then restore the food and bot populations.
///
/// Agents are visited in map order and each sees the effects of the
/// agents before it (eaten food is gone, earlier victims are no longer
/// obstacles). Removals happen only after the whole pass.
pub fn resolve(world: &mut World) -> ResolveReport {
    let mut report = ResolveReport::default();
    let order: Vec<AgentId> = world.agents.keys().copied().collect();

    for id in order {
        let Some((head, head_radius)) = world
            .agents
            .get(&id)
            .filter(|s| s.is_alive())
            .and_then(|s| s.head().map(|h| (h.position, h.radius)))
        else {
            continue;
        };

        let (eaten, mass_gain) = consume_food(world, head, head_radius);
        if eaten > 0 {
            if let Some(snake) = world.agents.get_mut(&id) {
                snake.mass += mass_gain;
                snake.score = snake
                    .score
                    .saturating_add(eaten as u32 * food::SCORE_PER_ITEM);
            }
            report.food_eaten += eaten;
        }

        if let Some(killer) = find_body_hit(world, id, head, head_radius) {
            report.food_dropped += kill(world, id, killer);
            report.deaths.push(DeathRecord {
                id,
                cause: DeathCause::BodyCollision { killer },
            });
            continue;
        }

        if !world.in_bounds(head) {
            if let Some(snake) = world.agents.get_mut(&id) {
                snake.dead = true;
            }
            report.deaths.push(DeathRecord {
                id,
                cause: DeathCause::OutOfBounds,
            });
        }
    }

    report.food_spawned = population::replenish_food(world);
    report.replacements = population::replace_dead_bots(world);
    report
}

/// Remove every food item touching the head; returns (count, mass gained)
fn consume_food(world: &mut World, head: Vec2, head_radius: f32) -> (usize, f32) {
    let mut eaten = 0;
    let mut gain = 0.0;
    world.foods.retain(|item| {
        let reach = head_radius + item.radius;
        if item.position.distance_sq_to(head) <= reach * reach {
            eaten += 1;
            gain += item.value * food::MASS_PER_VALUE;
            false
        } else {
            true
        }
    });
    (eaten, gain)
}

/// First live agent whose body (head excluded) overlaps the given head
fn find_body_hit(world: &World, id: AgentId, head: Vec2, head_radius: f32) -> Option<AgentId> {
    world
        .agents
        .values()
        .filter(|other| other.id != id && other.is_alive())
        .find(|other| body_overlaps(other, head, head_radius))
        .map(|other| other.id)
}

/// Whether `head` hits any non-head segment of `other`
pub fn body_overlaps(other: &Snake, head: Vec2, head_radius: f32) -> bool {
    other.segments.iter().skip(1).any(|segment| {
        let reach = head_radius + segment.radius - collision::FORGIVENESS;
        reach > 0.0 && segment.position.distance_sq_to(head) < reach * reach
    })
}

/// Mark the victim dead, scatter its body as food and credit the killer
/// (credit only when the victim is the player). Returns food dropped.
fn kill(world: &mut World, victim: AgentId, killer: AgentId) -> usize {
    let Some(snake) = world.agents.get_mut(&victim) else {
        return 0;
    };
    snake.dead = true;
    let is_player = snake.is_player();
    let color = snake.color.clone();
    let drop_points: SmallVec<[Vec2; 16]> = snake
        .segments
        .iter()
        .step_by(food::DEATH_STRIDE)
        .map(|s| s.position)
        .collect();

    for point in &drop_points {
        let id = world.next_entity_id();
        let item = create_death_food(id, *point, &color, &mut world.rng);
        world.foods.push(item);
    }

    if is_player {
        if let Some(credited) = world.agents.get_mut(&killer) {
            credited.kills += 1;
            credited.score = credited.score.saturating_add(collision::KILL_BONUS);
        }
    }

    tracing::debug!(%victim, %killer, dropped = drop_points.len(), "agent killed");
    drop_points.len()
}
