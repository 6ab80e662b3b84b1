//! The simulation world: platform registry, live enemies and the player.
//!
//! The world owns both entity collections and is the only mutator. The
//! player's collision pass reads them as slices and reports contacts back;
//! stomp removals are applied here, by enemy id, strictly after that pass.
//! Each enemy carries its own spawn record, so removing one can never
//! desynchronize a parallel list.

use aurora_core::states::AudioStatus;

use crate::enemy::{EnemyId, PatrolEnemy, SPAWN_HEIGHT_ABOVE_PLATFORM};
use crate::level::{build_platforms, Platform};
use crate::player::{EnemyContact, InputSample, PlayerCharacter};

/// One-shot sound effects the world can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    EnemyDown,
    PlayerDown,
}

#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Populated only when the audio flag is enabled.
    pub sounds: Vec<Sfx>,
    pub player_died: bool,
}

pub struct World {
    pub platforms: Vec<Platform>,
    pub enemies: Vec<PatrolEnemy>,
    pub player: PlayerCharacter,
}

impl World {
    /// Fresh session: every spawn point gets a platform and an enemy 16
    /// units above it; the player starts at the spawn position.
    pub fn new() -> Self {
        let platforms = build_platforms();
        let enemies = platforms
            .iter()
            .enumerate()
            .map(|(index, platform)| {
                PatrolEnemy::spawn(
                    EnemyId(index as u32),
                    platform.aabb.center_x,
                    platform.aabb.center_y - SPAWN_HEIGHT_ABOVE_PLATFORM,
                )
            })
            .collect();

        Self {
            platforms,
            enemies,
            player: PlayerCharacter::spawn(),
        }
    }

    /// Advance the whole world by one fixed step.
    pub fn tick(&mut self, input: InputSample, audio: AudioStatus) -> TickEvents {
        let contact = self.player.update(input, &self.platforms, &self.enemies);
        let events = self.apply_contact(contact, audio);

        for enemy in &mut self.enemies {
            enemy.advance();
            enemy.animate();
        }

        events
    }

    fn apply_contact(&mut self, contact: EnemyContact, audio: AudioStatus) -> TickEvents {
        let mut events = TickEvents::default();

        if !contact.stomped.is_empty() {
            self.enemies.retain(|enemy| !contact.stomped.contains(&enemy.id));
            log::info!(
                "Stomped {} enemy(ies), {} remaining",
                contact.stomped.len(),
                self.enemies.len()
            );
            if audio.is_enabled() {
                events
                    .sounds
                    .extend(contact.stomped.iter().map(|_| Sfx::EnemyDown));
            }
        }

        if contact.lethal {
            log::info!("Player ran into an enemy");
            events.player_died = true;
            if audio.is_enabled() {
                events.sounds.push(Sfx::PlayerDown);
            }
        }

        events
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::SPAWN_POINTS;

    fn park_player_far_away(world: &mut World) {
        world.player.aabb.center_x = 0.0;
        world.player.aabb.center_y = 0.0;
    }

    /// Place the player's feet strictly inside the enemy's upper half.
    fn stomp_position(world: &mut World, enemy_index: usize) {
        let enemy_box = world.enemies[enemy_index].aabb;
        world.player.aabb.center_x = enemy_box.center_x;
        world.player.aabb.set_bottom(enemy_box.top() + 3.0);
        // Falling, but slowly enough not to land on the paired platform.
        world.player.velocity_y = 0.0;
        world.player.grounded = false;
    }

    #[test]
    fn spawns_paired_platforms_and_enemies() {
        let world = World::new();
        assert_eq!(world.platforms.len(), SPAWN_POINTS.len());
        assert_eq!(world.enemies.len(), SPAWN_POINTS.len());
        for (enemy, platform) in world.enemies.iter().zip(world.platforms.iter()) {
            assert_eq!(enemy.aabb.center_x, platform.aabb.center_x);
            assert_eq!(
                enemy.aabb.center_y,
                platform.aabb.center_y - SPAWN_HEIGHT_ABOVE_PLATFORM
            );
        }
    }

    #[test]
    fn enemy_ids_are_unique() {
        let world = World::new();
        let mut ids: Vec<_> = world.enemies.iter().map(|e| e.id).collect();
        ids.sort_by_key(|id| id.0);
        ids.dedup();
        assert_eq!(ids.len(), SPAWN_POINTS.len());
    }

    #[test]
    fn stomp_removes_exactly_that_enemy() {
        let mut world = World::new();
        let target = world.enemies[3].id;
        stomp_position(&mut world, 3);

        let events = world.tick(InputSample::default(), AudioStatus::Enabled);

        assert!(!events.player_died);
        assert_eq!(events.sounds, vec![Sfx::EnemyDown]);
        assert_eq!(world.enemies.len(), SPAWN_POINTS.len() - 1);
        assert!(world.enemies.iter().all(|e| e.id != target));
    }

    #[test]
    fn stomp_sound_respects_audio_flag() {
        let mut world = World::new();
        stomp_position(&mut world, 3);

        let events = world.tick(InputSample::default(), AudioStatus::Disabled);

        // The kill still happens; only the sound is suppressed.
        assert!(events.sounds.is_empty());
        assert_eq!(world.enemies.len(), SPAWN_POINTS.len() - 1);
    }

    #[test]
    fn lethal_overlap_reports_death_and_keeps_enemies() {
        let mut world = World::new();
        let enemy_box = world.enemies[0].aabb;
        world.player.aabb.center_x = enemy_box.center_x;
        // Feet below the enemy's vertical center: a side/body hit.
        world.player.aabb.set_bottom(enemy_box.center_y + 2.0);
        world.player.grounded = true;

        let events = world.tick(InputSample::default(), AudioStatus::Enabled);

        assert!(events.player_died);
        assert_eq!(events.sounds, vec![Sfx::PlayerDown]);
        assert_eq!(world.enemies.len(), SPAWN_POINTS.len());
    }

    #[test]
    fn double_stomp_removes_both_without_corruption() {
        let mut world = World::new();
        // Park two enemies on top of each other so one pass hits both.
        let spot = world.enemies[5].aabb;
        world.enemies[6].aabb = spot;
        let (a, b) = (world.enemies[5].id, world.enemies[6].id);

        world.player.aabb.center_x = spot.center_x;
        world.player.aabb.set_bottom(spot.top() + 3.0);
        world.player.grounded = false;
        world.player.velocity_y = 0.0;

        let events = world.tick(InputSample::default(), AudioStatus::Enabled);

        assert!(!events.player_died);
        assert_eq!(events.sounds.len(), 2);
        assert_eq!(world.enemies.len(), SPAWN_POINTS.len() - 2);
        assert!(world.enemies.iter().all(|e| e.id != a && e.id != b));
    }

    #[test]
    fn enemies_patrol_when_player_is_elsewhere() {
        let mut world = World::new();
        park_player_far_away(&mut world);
        let starts: Vec<f32> = world.enemies.iter().map(|e| e.aabb.center_x).collect();

        world.tick(InputSample::default(), AudioStatus::Enabled);

        for (enemy, start_x) in world.enemies.iter().zip(starts) {
            assert_eq!(enemy.aabb.center_x, start_x - 1.0, "first step goes left");
        }
    }
}
