pub mod camera;
pub mod constants;
pub mod engine;
pub mod events;
pub mod input;
pub mod performance;
pub mod snapshot;
pub mod spatial;
pub mod spawn;
pub mod state;
pub mod stats;
pub mod systems;
