//! Circular layout for the lifecycle diagram.
//!
//! Stages are placed evenly on a circle, first stage at twelve o'clock,
//! proceeding clockwise in screen coordinates (y grows downwards).

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Default radius used when projecting the lifecycle graph.
pub const DEFAULT_RADIUS: f64 = 240.0;

/// 2D position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate the distance to another position
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Positions for `count` nodes on a circle of `radius` centred on the origin.
pub fn circle_layout(count: usize, radius: f64) -> Vec<Position> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![Position::default()];
    }

    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64 - FRAC_PI_2;
            Position::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}
