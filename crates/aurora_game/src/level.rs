//! Static level layout: the platform registry and its spawn table.
//!
//! The layout is fixed at startup. Each spawn point centers one platform and
//! one patrolling enemy 16 units above it; neither collection changes shape
//! afterwards except for enemies removed by stomps.

use aurora_core::geom::Aabb;
use aurora_core::sprite::{SheetId, SpriteKey};

pub const SCREEN_WIDTH: f32 = 900.0;
pub const SCREEN_HEIGHT: f32 = 700.0;

/// Platforms render (and collide) at this multiple of their base sprite.
pub const PLATFORM_SCALE: f32 = 5.0;
const PLATFORM_BASE_W: f32 = 12.0;
const PLATFORM_BASE_H: f32 = 4.0;

/// Paired platform/enemy spawn centers, in authoring order.
pub const SPAWN_POINTS: [(f32, f32); 10] = [
    (500.0, 500.0),
    (100.0, 200.0),
    (700.0, 150.0),
    (300.0, 100.0),
    (250.0, 400.0),
    (650.0, 480.0),
    (350.0, 320.0),
    (120.0, 520.0),
    (580.0, 220.0),
    (430.0, 180.0),
];

/// A static collidable rectangle. Never moves or despawns.
#[derive(Debug, Clone, Copy)]
pub struct Platform {
    pub aabb: Aabb,
}

impl Platform {
    pub fn new(center_x: f32, center_y: f32) -> Self {
        Self {
            aabb: Aabb::new(
                center_x,
                center_y,
                PLATFORM_BASE_W * PLATFORM_SCALE * 0.5,
                PLATFORM_BASE_H * PLATFORM_SCALE * 0.5,
            ),
        }
    }

    pub fn sprite() -> SpriteKey {
        SpriteKey::single(SheetId::Platform)
    }
}

pub fn build_platforms() -> Vec<Platform> {
    SPAWN_POINTS
        .iter()
        .map(|&(x, y)| Platform::new(x, y))
        .collect()
}
