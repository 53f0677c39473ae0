//! Latched player intent
//!
//! The input side overwrites the latch whenever it likes; the simulation reads
//! the latest value once at the start of each step. No queue, last write wins.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::game::state::{AgentId, World};

/// Most recent intent written by the input side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatchedIntent {
    pub desired_heading: Option<f32>,
    pub boosting: bool,
}

/// Clonable handle to the player's latched intent
#[derive(Clone, Default)]
pub struct InputLatch {
    inner: Arc<Mutex<LatchedIntent>>,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a new heading; ids other than the player and non-finite angles are ignored
    pub fn set_desired_heading(&self, id: AgentId, angle: f32) -> bool {
        if !id.is_player() || !angle.is_finite() {
            return false;
        }
        self.inner.lock().desired_heading = Some(angle);
        true
    }

    /// Latch the boost intent; ids other than the player are ignored
    pub fn set_boost_intent(&self, id: AgentId, boosting: bool) -> bool {
        if !id.is_player() {
            return false;
        }
        self.inner.lock().boosting = boosting;
        true
    }

    /// Current latched value
    pub fn current(&self) -> LatchedIntent {
        *self.inner.lock()
    }

    /// Copy the latched intent onto the live player, if there is one
    pub fn apply(&self, world: &mut World) -> bool {
        let intent = self.current();
        match world.player_mut() {
            Some(player) if player.is_alive() => {
                if let Some(angle) = intent.desired_heading {
                    player.desired_heading = angle;
                }
                player.boosting = intent.boosting;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::game::spawn::create_player;
    use crate::util::vec2::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world_with_player() -> World {
        let mut world = World::new(&SimConfig {
            seed: Some(2),
            ..SimConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(2);
        world.add_agent(create_player("P", Vec2::new(100.0, 100.0), "#fff", "default", &mut rng));
        world
    }

    #[test]
    fn test_last_write_wins() {
        let latch = InputLatch::new();
        latch.set_desired_heading(AgentId::PLAYER, 1.0);
        latch.set_desired_heading(AgentId::PLAYER, 2.0);
        latch.set_boost_intent(AgentId::PLAYER, true);

        let mut world = world_with_player();
        assert!(latch.apply(&mut world));

        let player = world.player().unwrap();
        assert_eq!(player.desired_heading, 2.0);
        assert!(player.boosting);
    }

    #[test]
    fn test_non_player_ids_ignored() {
        let latch = InputLatch::new();
        assert!(!latch.set_desired_heading(AgentId(4), 1.0));
        assert!(!latch.set_boost_intent(AgentId(4), true));
        assert!(!latch.set_desired_heading(AgentId::PLAYER, f32::INFINITY));
        assert_eq!(latch.current(), LatchedIntent::default());
    }

    #[test]
    fn test_heading_held_until_first_write() {
        let latch = InputLatch::new();
        let mut world = world_with_player();
        world.player_mut().unwrap().desired_heading = 0.7;

        latch.apply(&mut world);

        assert_eq!(world.player().unwrap().desired_heading, 0.7);
    }

    #[test]
    fn test_dead_or_missing_player_skipped() {
        let latch = InputLatch::new();
        latch.set_boost_intent(AgentId::PLAYER, true);

        let mut world = world_with_player();
        world.player_mut().unwrap().dead = true;
        assert!(!latch.apply(&mut world));
        assert!(!world.player().unwrap().boosting);

        world.remove_agent(AgentId::PLAYER);
        assert!(!latch.apply(&mut world));
    }

    #[test]
    fn test_latch_shared_across_threads() {
        let latch = InputLatch::new();
        let writer = latch.clone();
        std::thread::spawn(move || {
            writer.set_desired_heading(AgentId::PLAYER, -1.25);
        })
        .join()
        .unwrap();

        assert_eq!(latch.current().desired_heading, Some(-1.25));
    }
}
