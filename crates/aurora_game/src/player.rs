//! The controlled actor: movement, gravity, platform resolution, screen
//! clamping and the enemy interaction check.
//!
//! Update order inside `update()` is load-bearing: intent and jump resolve
//! against the previous tick's grounded flag, animation samples the freshly
//! computed motion state, and the platform pass runs on the post-integration
//! position so the swept landing tolerance can compare against this tick's
//! velocity.

use aurora_core::animation::Animator;
use aurora_core::geom::Aabb;
use aurora_core::sprite::{SheetId, SpriteKey};
use aurora_core::states::{Facing, Motion};

use crate::enemy::{EnemyId, PatrolEnemy};
use crate::level::{Platform, SCREEN_HEIGHT, SCREEN_WIDTH};

pub const RUN_SPEED: f32 = 3.0;
pub const GRAVITY: f32 = 0.2;
/// Negative is up: the simulation runs in y-down screen space.
pub const JUMP_IMPULSE: f32 = -8.0;
pub const SPAWN_CENTER: (f32, f32) = (40.0, 170.0);

const PLAYER_HALF_W: f32 = 12.0;
const PLAYER_HALF_H: f32 = 16.0;

/// Held-key snapshot consumed by one tick. Built by the frontend from the
/// live input state; the simulation never reads ambient input.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSample {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// Result of the enemy pass: which enemies were stomped (to be removed by
/// the world, by id, after this read-only pass) and whether any overlap was
/// lethal instead.
#[derive(Debug, Clone, Default)]
pub struct EnemyContact {
    pub stomped: Vec<EnemyId>,
    pub lethal: bool,
}

pub struct PlayerCharacter {
    pub aabb: Aabb,
    pub velocity_y: f32,
    pub grounded: bool,
    intent_x: f32,
    pub motion: Motion,
    pub facing: Facing,
    animator: Animator,
    pub sprite: SpriteKey,
}

impl PlayerCharacter {
    pub fn spawn() -> Self {
        Self {
            aabb: Aabb::new(
                SPAWN_CENTER.0,
                SPAWN_CENTER.1,
                PLAYER_HALF_W,
                PLAYER_HALF_H,
            ),
            velocity_y: 0.0,
            grounded: false,
            intent_x: 0.0,
            motion: Motion::Still,
            facing: Facing::Right,
            animator: Animator::new(0.0, 1.0, 0.2),
            sprite: SpriteKey::new(SheetId::PlayerIdleRight, 0),
        }
    }

    /// One simulation tick. Platforms and enemies are read-only inputs; the
    /// world owns both collections and applies the returned contact report.
    pub fn update(
        &mut self,
        input: InputSample,
        platforms: &[Platform],
        enemies: &[PatrolEnemy],
    ) -> EnemyContact {
        self.resolve_intent(input);
        self.integrate_horizontal();
        self.animate();
        self.apply_gravity();
        self.resolve_platforms(platforms);
        self.clamp_to_screen();
        self.check_enemies(enemies)
    }

    fn resolve_intent(&mut self, input: InputSample) {
        self.intent_x = 0.0;
        self.motion = Motion::Still;
        if input.left {
            self.motion = Motion::Moving;
            self.intent_x = -1.0;
        }
        // Right is evaluated after left, so holding both resolves to +1.
        if input.right {
            self.motion = Motion::Moving;
            self.intent_x = 1.0;
        }

        // Facing persists across Still frames; the idle sprite keeps looking
        // the way the player last walked.
        if self.intent_x < 0.0 {
            self.facing = Facing::Left;
        } else if self.intent_x > 0.0 {
            self.facing = Facing::Right;
        }

        if input.jump && self.grounded {
            self.velocity_y = JUMP_IMPULSE;
            self.grounded = false;
        }
    }

    fn integrate_horizontal(&mut self) {
        self.aabb.center_x += self.intent_x * RUN_SPEED;
    }

    fn animate(&mut self) {
        let sheet = match (self.motion, self.facing) {
            (Motion::Moving, Facing::Right) => SheetId::PlayerRunRight,
            (Motion::Moving, Facing::Left) => SheetId::PlayerRunLeft,
            (Motion::Still, Facing::Right) => SheetId::PlayerIdleRight,
            (Motion::Still, Facing::Left) => SheetId::PlayerIdleLeft,
        };
        if self.animator.advance(sheet.frame_count() as usize) {
            self.sprite = SpriteKey::new(sheet, self.animator.frame_index() as u8);
        }
    }

    fn apply_gravity(&mut self) {
        if self.grounded {
            self.velocity_y = 0.0;
        } else {
            self.velocity_y += GRAVITY;
        }
        self.aabb.center_y += self.velocity_y;
    }

    fn resolve_platforms(&mut self, platforms: &[Platform]) {
        self.grounded = false;
        for platform in platforms {
            if !self.aabb.overlaps(&platform.aabb) {
                continue;
            }
            if self.velocity_y > 0.0
                && self.aabb.bottom() <= platform.aabb.top() + self.velocity_y
            {
                // Falling onto the platform. The velocity-wide tolerance
                // keeps fast falls from tunneling through thin platforms.
                self.aabb.set_bottom(platform.aabb.top());
                self.velocity_y = 0.0;
                self.grounded = true;
            } else if self.velocity_y < 0.0
                && self.aabb.top() >= platform.aabb.bottom() - self.velocity_y.abs()
            {
                // Head bump from below: snap under the platform, no bounce.
                self.aabb.set_top(platform.aabb.bottom());
                self.velocity_y = 0.0;
            }
        }
    }

    fn clamp_to_screen(&mut self) {
        self.aabb.center_x = self.aabb.center_x.clamp(0.0, SCREEN_WIDTH);
        if self.aabb.center_y > SCREEN_HEIGHT {
            self.aabb.center_y = SCREEN_HEIGHT;
            self.velocity_y = 0.0;
            // The world floor counts as support: jumping works from it.
            self.grounded = true;
        }
    }

    fn check_enemies(&self, enemies: &[PatrolEnemy]) -> EnemyContact {
        let mut contact = EnemyContact::default();
        for enemy in enemies {
            if !self.aabb.overlaps(&enemy.aabb) {
                continue;
            }
            let bottom = self.aabb.bottom();
            // A stomp lands the player's feet strictly inside the enemy's
            // upper half; anything else is a lethal touch.
            if bottom > enemy.aabb.top() && bottom < enemy.aabb.center_y {
                contact.stomped.push(enemy.id);
            } else {
                contact.lethal = true;
            }
        }
        contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_INPUT: InputSample = InputSample {
        left: false,
        right: false,
        jump: false,
    };

    fn tick(player: &mut PlayerCharacter, input: InputSample, platforms: &[Platform]) {
        player.update(input, platforms, &[]);
    }

    #[test]
    fn gravity_accumulates_while_airborne() {
        let mut player = PlayerCharacter::spawn();
        let mut last_vy = player.velocity_y;
        for _ in 0..10 {
            tick(&mut player, NO_INPUT, &[]);
            assert!((player.velocity_y - (last_vy + GRAVITY)).abs() < 1e-6);
            last_vy = player.velocity_y;
        }
    }

    #[test]
    fn falls_and_rests_on_platform_below() {
        let platform = Platform::new(100.0, 200.0);
        let mut player = PlayerCharacter::spawn();
        player.aabb.center_x = 100.0;
        player.aabb.center_y = 150.0;

        let mut settled = false;
        for _ in 0..200 {
            tick(&mut player, NO_INPUT, &[platform]);
            if player.grounded && player.velocity_y == 0.0 {
                settled = true;
                break;
            }
        }
        assert!(settled, "player should land on the platform");
        assert_eq!(player.aabb.bottom(), platform.aabb.top());

        // Landing is idempotent: further input-free ticks hold position.
        let rest_y = player.aabb.center_y;
        for _ in 0..4 {
            tick(&mut player, NO_INPUT, &[platform]);
            assert_eq!(player.aabb.center_y, rest_y);
        }
    }

    #[test]
    fn jump_only_from_ground() {
        let mut player = PlayerCharacter::spawn();
        assert!(!player.grounded);
        let vy_before = player.velocity_y;
        tick(
            &mut player,
            InputSample {
                jump: true,
                ..NO_INPUT
            },
            &[],
        );
        // Airborne jump input changes nothing beyond normal gravity.
        assert!((player.velocity_y - (vy_before + GRAVITY)).abs() < 1e-6);

        player.grounded = true;
        tick(
            &mut player,
            InputSample {
                jump: true,
                ..NO_INPUT
            },
            &[],
        );
        // Impulse applied, then one tick of gravity.
        assert!((player.velocity_y - (JUMP_IMPULSE + GRAVITY)).abs() < 1e-6);
        assert!(!player.grounded);
    }

    #[test]
    fn horizontal_position_stays_clamped() {
        let mut player = PlayerCharacter::spawn();
        for _ in 0..400 {
            tick(
                &mut player,
                InputSample {
                    left: true,
                    ..NO_INPUT
                },
                &[],
            );
            assert!(player.aabb.center_x >= 0.0);
        }
        assert_eq!(player.aabb.center_x, 0.0);

        for _ in 0..400 {
            tick(
                &mut player,
                InputSample {
                    right: true,
                    ..NO_INPUT
                },
                &[],
            );
            assert!(player.aabb.center_x <= SCREEN_WIDTH);
        }
        assert_eq!(player.aabb.center_x, SCREEN_WIDTH);
    }

    #[test]
    fn both_keys_resolve_right() {
        let mut player = PlayerCharacter::spawn();
        let x_before = player.aabb.center_x;
        tick(
            &mut player,
            InputSample {
                left: true,
                right: true,
                jump: false,
            },
            &[],
        );
        assert_eq!(player.aabb.center_x, x_before + RUN_SPEED);
        assert_eq!(player.facing, Facing::Right);
        assert_eq!(player.motion, Motion::Moving);
    }

    #[test]
    fn world_floor_stops_fall_and_supports_jump() {
        let mut player = PlayerCharacter::spawn();
        for _ in 0..300 {
            tick(&mut player, NO_INPUT, &[]);
        }
        assert_eq!(player.aabb.center_y, SCREEN_HEIGHT);
        assert_eq!(player.velocity_y, 0.0);

        // The floor counts as support, so a jump must eventually take.
        let mut jumped = false;
        for _ in 0..3 {
            tick(
                &mut player,
                InputSample {
                    jump: true,
                    ..NO_INPUT
                },
                &[],
            );
            if player.velocity_y < 0.0 {
                jumped = true;
                break;
            }
        }
        assert!(jumped, "jump should fire from the world floor");
    }

    #[test]
    fn head_bump_stops_rise_without_bounce() {
        let platform = Platform::new(100.0, 200.0);
        let mut player = PlayerCharacter::spawn();
        // Rising into the platform from just underneath.
        player.aabb.center_x = 100.0;
        player.aabb.set_top(platform.aabb.bottom() + 2.0);
        player.velocity_y = -6.0;

        tick(&mut player, NO_INPUT, &[platform]);
        assert_eq!(player.aabb.top(), platform.aabb.bottom());
        // Velocity is zeroed, not reflected.
        assert!((player.velocity_y - GRAVITY).abs() < 1e-6 || player.velocity_y == 0.0);
        assert!(!player.grounded);
    }

    #[test]
    fn idle_sprite_faces_last_walked_direction() {
        let mut player = PlayerCharacter::spawn();
        let walk_left = InputSample {
            left: true,
            ..NO_INPUT
        };
        // Walk left long enough for several animator firings.
        for _ in 0..10 {
            tick(&mut player, walk_left, &[]);
        }
        assert_eq!(player.sprite.sheet, SheetId::PlayerRunLeft);

        // Stand still: facing persists, so idle frames look left.
        for _ in 0..10 {
            tick(&mut player, NO_INPUT, &[]);
        }
        assert_eq!(player.facing, Facing::Left);
        assert_eq!(player.sprite.sheet, SheetId::PlayerIdleLeft);
    }

    #[test]
    fn stomp_and_lethal_classification() {
        let mut player = PlayerCharacter::spawn();
        let enemy = PatrolEnemy::spawn(EnemyId(7), 100.0, 300.0);

        // Feet strictly inside the enemy's upper half: a stomp.
        player.aabb.center_x = 100.0;
        player.aabb.set_bottom(enemy.aabb.top() + 3.0);
        let contact = player.check_enemies(std::slice::from_ref(&enemy));
        assert_eq!(contact.stomped, vec![EnemyId(7)]);
        assert!(!contact.lethal);

        // Deep overlap (feet below the enemy's center): lethal.
        player.aabb.set_bottom(enemy.aabb.center_y + 1.0);
        let contact = player.check_enemies(std::slice::from_ref(&enemy));
        assert!(contact.stomped.is_empty());
        assert!(contact.lethal);

        // No overlap at all: nothing happens.
        player.aabb.center_x = 400.0;
        let contact = player.check_enemies(std::slice::from_ref(&enemy));
        assert!(contact.stomped.is_empty());
        assert!(!contact.lethal);
    }
}
