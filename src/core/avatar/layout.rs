//! Fitting the avatar into the viewport.
//!
//! The avatar is anchored at its centre and scaled to fit a target box:
//!
//! | Viewport            | Target box             | Anchor position        |
//! |---------------------|------------------------|------------------------|
//! | mobile (< 768 wide) | 80% width, 50% height  | (50% width, 35% height) |
//! | desktop             | 50% width, 85% height  | (30% width, 55% height) |

use serde::{Deserialize, Serialize};

use super::AvatarEngine;

/// Widths below this use the mobile layout.
pub const MOBILE_BREAKPOINT: f32 = 768.0;

/// Canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_mobile(&self) -> bool {
        self.width < MOBILE_BREAKPOINT
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Unscaled model size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Computed pose for the avatar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub anchor: (f32, f32),
    pub x: f32,
    pub y: f32,
}

impl Placement {
    /// Push this placement into an engine.
    pub fn apply(&self, engine: &mut dyn AvatarEngine) {
        engine.set_anchor(self.anchor.0, self.anchor.1);
        engine.set_scale(self.scale);
        engine.set_position(self.x, self.y);
    }
}

/// Compute the placement of a model of `model` size in `viewport`.
pub fn place(viewport: Viewport, model: Size) -> Placement {
    let mobile = viewport.is_mobile();

    let target_height = viewport.height * if mobile { 0.5 } else { 0.85 };
    let target_width = viewport.width * if mobile { 0.8 } else { 0.5 };

    let scale = if model.width > 0.0 && model.height > 0.0 {
        (target_height / model.height).min(target_width / model.width)
    } else {
        1.0
    };

    let (x, y) = if mobile {
        (viewport.width / 2.0, viewport.height * 0.35)
    } else {
        (viewport.width * 0.3, viewport.height * 0.55)
    };

    Placement {
        scale,
        anchor: (0.5, 0.5),
        x,
        y,
    }
}
