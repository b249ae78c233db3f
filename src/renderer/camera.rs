//! Camera: which part of the world is on screen

use crate::geometry::{Point, Rect, Size};
use crate::settings::SimSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World point at the middle of the screen
    pub center: Point,
    /// Visible area in meters
    pub viewport: Size,
    pub pixels_per_meter: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_settings(&SimSettings::default())
    }
}

impl Camera {
    pub fn new(viewport: Size, pixels_per_meter: f64) -> Self {
        Self {
            center: Point::ZERO,
            viewport,
            pixels_per_meter,
        }
    }

    pub fn from_settings(settings: &SimSettings) -> Self {
        Self::new(settings.viewport, settings.pixels_per_meter)
    }

    /// The visible world rect
    pub fn view_rect(&self) -> Rect {
        Rect::new(self.center, self.viewport)
    }

    /// Screen size in pixels
    pub fn screen_size(&self) -> Size {
        self.viewport * self.pixels_per_meter
    }

    /// World point to pixel coordinates, origin at the top left of the screen
    pub fn to_screen(&self, p: Point) -> Point {
        let rel = p - self.center + self.viewport.br();
        rel * self.pixels_per_meter
    }

    pub fn to_world(&self, px: Point) -> Point {
        px / self.pixels_per_meter - self.viewport.br() + self.center
    }
}
