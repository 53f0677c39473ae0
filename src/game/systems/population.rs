use rand::Rng;
use smallvec::SmallVec;

use crate::game::constants::ai::NAME_INDEX_RANGE;
use crate::game::spawn::{create_bot, create_food};
use crate::game::state::{AgentId, World};

/// (removed, replacement) pairs from one replacement pass
pub type Replacements = SmallVec<[(AgentId, AgentId); 4]>;

/// Top food back up to the target count; returns how many items were created
pub fn replenish_food(world: &mut World) -> usize {
    let missing = world.food_target.saturating_sub(world.foods.len());
    for _ in 0..missing {
        let id = world.next_entity_id();
        let item = create_food(id, world.map_width, world.map_height, &mut world.rng);
        world.foods.push(item);
    }
    missing
}

/// Spawn one fresh bot with a new identity
pub fn spawn_bot(world: &mut World, name_index: usize) -> AgentId {
    let id = world.next_agent_id();
    let bot = create_bot(id, world.map_width, world.map_height, name_index, &mut world.rng);
    world.add_agent(bot);
    id
}

/// Initial bot population: one bot per name slot
pub fn spawn_initial_bots(world: &mut World) {
    for index in 0..world.bot_count {
        spawn_bot(world, index);
    }
}

/// Remove every dead bot and spawn a replacement for each
///
/// Runs after collision resolution so no pass sees a half-replaced world.
/// Also fills any shortfall so the autonomous count always equals the target.
pub fn replace_dead_bots(world: &mut World) -> Replacements {
    let dead: SmallVec<[AgentId; 4]> = world
        .agents
        .values()
        .filter(|s| s.dead && s.is_autonomous())
        .map(|s| s.id)
        .collect();

    let mut replaced = Replacements::new();
    for old in dead {
        world.remove_agent(old);
        let name_index = world.rng.gen_range(0..NAME_INDEX_RANGE);
        let new = spawn_bot(world, name_index);
        tracing::debug!(%old, %new, "bot replaced");
        replaced.push((old, new));
    }

    while world.autonomous_count() < world.bot_count {
        let name_index = world.rng.gen_range(0..NAME_INDEX_RANGE);
        let id = spawn_bot(world, name_index);
        tracing::debug!(%id, "bot spawned to fill population");
    }

    replaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::game::constants::ai::NAMES;

    fn world(bots: usize, food: usize) -> World {
        World::new(&SimConfig {
            seed: Some(21),
            bot_count: bots,
            food_target: food,
            ..SimConfig::default()
        })
    }

    #[test]
    fn test_replenish_food_to_target() {
        let mut world = world(0, 40);
        assert_eq!(replenish_food(&mut world), 40);
        assert_eq!(world.foods.len(), 40);
        assert_eq!(replenish_food(&mut world), 0);

        world.foods.truncate(25);
        assert_eq!(replenish_food(&mut world), 15);
        assert_eq!(world.foods.len(), 40);
    }

    #[test]
    fn test_food_ids_are_unique() {
        let mut world = world(0, 100);
        replenish_food(&mut world);
        let mut ids: Vec<u64> = world.foods.iter().map(|f| f.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_initial_bots_use_name_slots() {
        let mut world = world(4, 1);
        spawn_initial_bots(&mut world);
        assert_eq!(world.autonomous_count(), 4);

        let mut names: Vec<&str> = world.agents.values().map(|s| s.username.as_str()).collect();
        names.sort_unstable();
        let mut expected: Vec<&str> = NAMES[..4].to_vec();
        expected.sort_unstable();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_dead_bots_replaced_with_new_identity() {
        let mut world = world(5, 1);
        spawn_initial_bots(&mut world);
        let victims: Vec<AgentId> = world.agents.keys().copied().take(2).collect();
        for id in &victims {
            world.get_agent_mut(*id).unwrap().dead = true;
        }

        let replaced = replace_dead_bots(&mut world);

        assert_eq!(replaced.len(), 2);
        assert_eq!(world.autonomous_count(), 5);
        for (old, new) in replaced {
            assert!(victims.contains(&old));
            assert!(world.get_agent(old).is_none());
            let fresh = world.get_agent(new).unwrap();
            assert!(fresh.is_alive());
            assert_eq!(fresh.score, 0);
        }
    }

    #[test]
    fn test_dead_player_left_in_place() {
        let mut world = world(1, 1);
        spawn_initial_bots(&mut world);
        let mut rng = rand::thread_rng();
        let mut player = crate::game::spawn::create_player(
            "P",
            world.map_center(),
            "#fff",
            "default",
            &mut rng,
        );
        player.dead = true;
        world.add_agent(player);

        let replaced = replace_dead_bots(&mut world);

        assert!(replaced.is_empty());
        assert!(world.player().unwrap().dead);
    }

    #[test]
    fn test_shortfall_filled() {
        let mut world = world(3, 1);
        let replaced = replace_dead_bots(&mut world);
        assert!(replaced.is_empty());
        assert_eq!(world.autonomous_count(), 3);
    }
}
