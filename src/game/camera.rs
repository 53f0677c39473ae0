//! Derived view state for the presentation side

use serde::{Deserialize, Serialize};

use crate::game::constants::camera::BASE_MASS;
use crate::game::state::Snake;
use crate::util::vec2::Vec2;

/// Focus point and zoom derived from the player's head and mass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub focus: Vec2,
    pub zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Camera {
    pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
        Self {
            focus: Vec2::ZERO,
            zoom: 1.0_f32.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
        }
    }

    /// Zoom for a given mass: heavier agents see more of the world
    pub fn zoom_for_mass(&self, mass: f32) -> f32 {
        if mass <= 0.0 {
            return self.max_zoom;
        }
        (BASE_MASS / mass).clamp(self.min_zoom, self.max_zoom)
    }

    /// Track the given agent's head; headless agents leave the camera untouched
    pub fn follow(&mut self, snake: &Snake) {
        if let Some(head) = snake.head_position() {
            self.focus = head;
            self.zoom = self.zoom_for_mass(snake.mass);
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        use crate::game::constants::camera::{MAX_ZOOM, MIN_ZOOM};
        Self::new(MIN_ZOOM, MAX_ZOOM)
    }
}
