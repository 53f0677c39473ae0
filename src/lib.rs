//! Slither Arena
//!
//! A single-process snake arena: one player-controlled agent and a pool of
//! autonomous bots grow by eating food on a bounded map and die when their
//! head touches another agent's body or leaves the map.
//!
//! The [`Simulation`] owns the world and advances it one step at a time.
//! Input arrives through a latched [`game::input::InputLatch`], outcomes leave
//! through [`game::events`] subscriptions and per-frame snapshots.
//!
//! # Features
//!
//! - `metrics_server` - Prometheus/JSON endpoint for the headless driver (enabled by default)

pub mod config;
pub mod game;
pub mod metrics;
pub mod util;

pub use config::{ConfigError, SimConfig};
pub use game::engine::{FrameClock, Simulation, StepReport};
