//! Ranking and end-of-life statistics
//!
//! Computes the leaderboard, the player's rank, and the snapshot handed to
//! the persistence side when the player dies.

use serde::{Deserialize, Serialize};

use crate::game::constants::progression::XP_PER_KILL;
use crate::game::state::{AgentId, Snake, World};

/// Immutable record of one player life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathStats {
    pub score: u32,
    /// Mass at death, floored
    pub mass: u32,
    pub kills: u32,
    /// Whole seconds of simulated time survived
    pub time_alive_secs: u32,
    /// 1-based rank by score among live agents
    pub rank: u32,
}

impl DeathStats {
    pub fn from_snake(snake: &Snake, time_alive_secs: u32, rank: u32) -> Self {
        Self {
            score: snake.score,
            mass: snake.mass.max(0.0).floor() as u32,
            kills: snake.kills,
            time_alive_secs,
            rank,
        }
    }

    /// Experience granted for this life
    pub fn xp_gained(&self) -> u32 {
        self.score
            .saturating_add(self.kills.saturating_mul(XP_PER_KILL))
            .saturating_add(self.time_alive_secs)
    }
}

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: AgentId,
    pub username: String,
    pub score: u32,
}

/// Live agents ordered by score (desc); equal scores keep id order
fn ranked(world: &World) -> Vec<&Snake> {
    let mut live: Vec<&Snake> = world.alive_agents().collect();
    live.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    live
}

/// Rank of an agent among live agents; one past the live count if it is not live
pub fn rank_of(world: &World, id: AgentId) -> u32 {
    let live = ranked(world);
    let position = live
        .iter()
        .position(|s| s.id == id)
        .unwrap_or(live.len());
    (position + 1) as u32
}

pub fn player_rank(world: &World) -> u32 {
    rank_of(world, AgentId::PLAYER)
}

/// Top `limit` live agents by score
pub fn leaderboard(world: &World, limit: usize) -> Vec<LeaderboardEntry> {
    ranked(world)
        .into_iter()
        .take(limit)
        .map(|s| LeaderboardEntry {
            id: s.id,
            username: s.username.clone(),
            score: s.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::game::constants::progression::LEADERBOARD_SIZE;
    use crate::game::state::{Controller, Segment};
    use crate::util::vec2::Vec2;

    fn snake(id: u64, score: u32, dead: bool) -> Snake {
        Snake {
            segments: vec![Segment::new(Vec2::new(100.0, 100.0), 8.0)],
            heading: 0.0,
            desired_heading: 0.0,
            speed: 3.0,
            mass: 80.0,
            boosting: false,
            dead,
            score,
            kills: 0,
            controller: if id == 0 {
                Controller::Player
            } else {
                Controller::Autonomous
            },
            id: AgentId(id),
            username: format!("S{}", id),
            color: "#fff".to_string(),
            skin: "default".to_string(),
        }
    }

    fn world_with(snakes: Vec<Snake>) -> World {
        let mut world = World::new(&SimConfig {
            seed: Some(1),
            ..SimConfig::default()
        });
        for s in snakes {
            world.add_agent(s);
        }
        world
    }

    #[test]
    fn test_player_rank_by_score() {
        let world = world_with(vec![
            snake(0, 40, false),
            snake(1, 100, false),
            snake(2, 10, false),
            snake(3, 50, false),
        ]);
        assert_eq!(player_rank(&world), 3);
    }

    #[test]
    fn test_dead_player_ranks_past_live_set() {
        let world = world_with(vec![
            snake(0, 1000, true),
            snake(1, 100, false),
            snake(2, 10, false),
            snake(3, 5, true),
        ]);
        // Two live agents
        assert_eq!(player_rank(&world), 3);
    }

    #[test]
    fn test_missing_player_ranks_past_live_set() {
        let world = world_with(vec![snake(1, 100, false)]);
        assert_eq!(player_rank(&world), 2);
    }

    #[test]
    fn test_leaderboard_top_ten_sorted() {
        let snakes = (0..15).map(|i| snake(i, (i as u32 * 7) % 11, false)).collect();
        let world = world_with(snakes);

        let board = leaderboard(&world, LEADERBOARD_SIZE);

        assert_eq!(board.len(), LEADERBOARD_SIZE);
        for pair in board.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[test]
    fn test_leaderboard_skips_dead() {
        let world = world_with(vec![snake(1, 100, true), snake(2, 5, false)]);
        let board = leaderboard(&world, LEADERBOARD_SIZE);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].id, AgentId(2));
        assert_eq!(board[0].username, "S2");
    }

    #[test]
    fn test_death_stats_and_xp() {
        let mut s = snake(0, 120, true);
        s.mass = 155.9;
        s.kills = 2;

        let stats = DeathStats::from_snake(&s, 42, 3);

        assert_eq!(stats.mass, 155);
        assert_eq!(stats.score, 120);
        assert_eq!(stats.xp_gained(), 120 + 2 * 50 + 42);
    }
}
