/// Simulation clock constants
///
/// Step deltas are measured in reference frames: 1.0 = one 60 Hz frame.
pub mod clock {
    /// Length of one reference frame in milliseconds
    pub const FRAME_MS: f32 = 16.67;
    /// Length of one reference frame in seconds
    pub const FRAME_SECONDS: f32 = FRAME_MS / 1000.0;
    /// Largest delta the frame clock reports for one tick
    pub const MAX_DELTA_FRAMES: f32 = 10.0;
    /// Default driver tick rate in Hz
    pub const TICK_RATE: u32 = 60;
}

/// Locomotion constants
pub mod movement {
    /// Fraction of the heading error closed per frame
    pub const TURN_RATE: f32 = 0.08;
    /// Player base speed (world units per frame)
    pub const PLAYER_SPEED: f32 = 3.0;
    /// Bot base speed range (world units per frame)
    pub const BOT_SPEED_MIN: f32 = 2.5;
    pub const BOT_SPEED_MAX: f32 = 3.5;
}

/// Boost constants
pub mod boost {
    /// Speed multiplier while boosting
    pub const SPEED_FACTOR: f32 = 1.8;
    /// Boost only engages while mass is strictly above this
    pub const MIN_MASS: f32 = 50.0;
    /// Mass burned per frame while boosting
    pub const MASS_DRAIN: f32 = 0.3;
    /// Score lost per boosted step
    pub const SCORE_PENALTY: u32 = 1;
}

/// Body chain constants
pub mod body {
    /// Head radius before mass scaling
    pub const BASE_RADIUS: f32 = 8.0;
    /// Radius of freshly constructed segments
    pub const INITIAL_RADIUS: f32 = 8.0;
    /// Mass per body segment: target length = floor(mass / MASS_PER_SEGMENT)
    pub const MASS_PER_SEGMENT: f32 = 8.0;
    /// Mass granted per initial segment at construction
    pub const MASS_PER_INITIAL_SEGMENT: f32 = 10.0;
    /// Player chain length at spawn
    pub const PLAYER_SEGMENTS: usize = 10;
    /// Bot chain length range at spawn (inclusive)
    pub const BOT_SEGMENTS_MIN: usize = 8;
    pub const BOT_SEGMENTS_MAX: usize = 12;
    /// Chain never drops below this many segments
    pub const MIN_SEGMENTS: usize = 6;
    /// Boost drain never takes mass below this
    pub const MIN_MASS: f32 = MIN_SEGMENTS as f32 * MASS_PER_SEGMENT;
    /// Tail segment is this much thinner than the head
    pub const TAPER: f32 = 0.3;
    /// Neighbouring segments are kept within (r1 + r2) * SPACING_FACTOR
    pub const SPACING_FACTOR: f32 = 0.5;
}

/// Food constants
pub mod food {
    /// Food items kept in the world
    pub const TARGET_COUNT: usize = 500;
    /// Radius range of regular food
    pub const RADIUS_MIN: f32 = 4.0;
    pub const RADIUS_MAX: f32 = 7.0;
    /// Value of regular food
    pub const VALUE: f32 = 1.0;
    /// Mass gained per unit of food value
    pub const MASS_PER_VALUE: f32 = 5.0;
    /// Score gained per item eaten
    pub const SCORE_PER_ITEM: u32 = 1;
    /// Food dropped on death
    pub const DEATH_RADIUS: f32 = 5.0;
    pub const DEATH_VALUE: f32 = 2.0;
    /// Death food is scattered up to ±DEATH_JITTER / 2 around its segment
    pub const DEATH_JITTER: f32 = 20.0;
    /// Death food is dropped on every DEATH_STRIDE-th segment
    pub const DEATH_STRIDE: usize = 2;

    pub const PALETTE: [&str; 12] = [
        "#ff4444", "#44ff44", "#4444ff", "#ffff44", "#ff44ff", "#44ffff",
        "#ff8844", "#88ff44", "#4488ff", "#ff4488", "#88ff88", "#8844ff",
    ];
}

/// Collision constants
pub mod collision {
    /// Subtracted from the radius sum so grazes do not kill
    pub const FORGIVENESS: f32 = 5.0;
    /// Score awarded to the agent whose body killed the player
    pub const KILL_BONUS: u32 = 50;
}

/// AI bot constants
pub mod ai {
    /// Number of AI bots kept in the world
    pub const COUNT: usize = 15;
    /// Sensing radius for food and threats
    pub const VISION_RANGE: f32 = 300.0;
    /// Threats are only noticed within this fraction of the vision range
    pub const THREAT_RANGE_FACTOR: f32 = 0.7;
    /// Per-frame chance of a wander nudge when nothing is in sight
    pub const WANDER_CHANCE: f64 = 0.02;
    /// Wander nudge is uniform in ±WANDER_SPREAD / 2 radians
    pub const WANDER_SPREAD: f32 = 0.5;
    /// Name index range for replacement bots
    pub const NAME_INDEX_RANGE: usize = 1000;

    pub const NAMES: [&str; 16] = [
        "SlitherBot", "SnakeAI", "Viper", "Cobra", "Python", "Anaconda",
        "Sidewinder", "Rattler", "Mamba", "Adder", "Boa", "Constrictor",
        "KingSnake", "GarterSnake", "CopperHead", "SeaSnake",
    ];

    pub const COLORS: [&str; 10] = [
        "#ff6b6b", "#4ecdc4", "#45b7d1", "#f9ca24", "#6c5ce7",
        "#a29bfe", "#fd79a8", "#fdcb6e", "#e17055", "#00b894",
    ];
}

/// World/spawn constants
pub mod world {
    pub const MAP_WIDTH: f32 = 5000.0;
    pub const MAP_HEIGHT: f32 = 5000.0;
    /// Player spawns within ±PLAYER_SPAWN_SPREAD / 2 of the map centre
    pub const PLAYER_SPAWN_SPREAD: f32 = 1000.0;
    pub const DEFAULT_SKIN: &str = "default";
}

/// Camera constants
pub mod camera {
    /// Player mass at which zoom is 1.0
    pub const BASE_MASS: f32 = 100.0;
    pub const MIN_ZOOM: f32 = 0.5;
    pub const MAX_ZOOM: f32 = 1.5;
}

/// Progression constants handed to the persistence side
pub mod progression {
    /// Experience granted per kill
    pub const XP_PER_KILL: u32 = 50;
    /// Leaderboard length shown on the HUD
    pub const LEADERBOARD_SIZE: usize = 10;
}

/// Target chain length for a given mass
#[inline]
pub fn target_segment_count(mass: f32) -> usize {
    let by_mass = (mass / body::MASS_PER_SEGMENT).floor().max(0.0) as usize;
    by_mass.max(body::MIN_SEGMENTS)
}

/// Head radius for a given mass: grows logarithmically
#[inline]
pub fn head_radius(mass: f32) -> f32 {
    body::BASE_RADIUS + 2.0 * (mass.max(0.0) / 10.0 + 1.0).ln()
}
