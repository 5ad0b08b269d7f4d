//! Combat system - hit detection, damage, death and respawn transitions

use uuid::Uuid;

use crate::ws::protocol::Vec3;

use super::registry::{SessionRegistry, MAX_HP};

/// A shot lands on any target strictly closer than this to the shot position
pub const HIT_RADIUS: f64 = 2.2;

/// Damage per registered hit
pub const SHOT_DAMAGE: u32 = 34;

/// Result of resolving a shot against one target
#[derive(Debug, Clone, PartialEq)]
pub enum ShotOutcome {
    /// Target survived with `hp` left
    Hit { target_id: Uuid, hp: u32 },
    /// Target died; the shooter was credited with the kill
    Killed { target_id: Uuid, shooter_id: Uuid },
}

/// Combat rules. Stateless; all state lives in the registry.
pub struct CombatSystem;

impl CombatSystem {
    /// Spherical hit test
    pub fn check_hit(target: &Vec3, shot: &Vec3) -> bool {
        target.distance(shot) < HIT_RADIUS
    }

    /// Apply damage to health, returns (new_health, is_dead)
    pub fn apply_damage(current_hp: u32, damage: u32) -> (u32, bool) {
        let new_hp = current_hp.saturating_sub(damage);
        (new_hp, new_hp == 0)
    }

    /// Hit-test one shot against every other live participant.
    ///
    /// A single shot may damage several overlapping targets. Nothing happens
    /// if the shooter is unknown or dead.
    pub fn resolve_shot(
        registry: &mut SessionRegistry,
        shooter_id: Uuid,
        shot_position: Vec3,
    ) -> Vec<ShotOutcome> {
        let shooter_alive = registry.get(&shooter_id).map_or(false, |p| p.alive);
        if !shooter_alive {
            return Vec::new();
        }

        let mut outcomes = Vec::new();
        for target in registry.iter_mut() {
            if target.id == shooter_id || !target.alive {
                continue;
            }
            if !Self::check_hit(&target.position, &shot_position) {
                continue;
            }

            let (new_hp, killed) = Self::apply_damage(target.hp, SHOT_DAMAGE);
            target.hp = new_hp;

            if killed {
                target.alive = false;
                target.deaths += 1;
                outcomes.push(ShotOutcome::Killed {
                    target_id: target.id,
                    shooter_id,
                });
            } else {
                outcomes.push(ShotOutcome::Hit {
                    target_id: target.id,
                    hp: new_hp,
                });
            }
        }

        let kills = outcomes
            .iter()
            .filter(|o| matches!(o, ShotOutcome::Killed { .. }))
            .count() as u32;
        if kills > 0 {
            if let Some(shooter) = registry.get_mut(&shooter_id) {
                shooter.kills += kills;
            }
        }

        outcomes
    }

    /// Bring a dead participant back at `position` with full health.
    ///
    /// Returns false without touching anything if the participant is gone
    /// (disconnected while dead) or already alive.
    pub fn respawn(registry: &mut SessionRegistry, id: Uuid, position: Vec3) -> bool {
        match registry.get_mut(&id) {
            Some(p) if !p.alive => {
                p.position = position;
                p.hp = MAX_HP;
                p.alive = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_at(registry: &mut SessionRegistry, position: Vec3) -> Uuid {
        let id = Uuid::new_v4();
        registry
            .create(id, position, "hsl(120,80%,60%)".to_string())
            .unwrap();
        id
    }

    #[test]
    fn hit_radius_is_strict() {
        let origin = Vec3::ZERO;
        assert!(CombatSystem::check_hit(&origin, &Vec3::new(2.19, 0.0, 0.0)));
        assert!(!CombatSystem::check_hit(&origin, &Vec3::new(2.2, 0.0, 0.0)));
        assert!(CombatSystem::check_hit(&origin, &Vec3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn apply_damage_clamps_at_zero() {
        assert_eq!(CombatSystem::apply_damage(100, 34), (66, false));
        assert_eq!(CombatSystem::apply_damage(30, 34), (0, true));
        assert_eq!(CombatSystem::apply_damage(34, 34), (0, true));
    }

    #[test]
    fn shot_in_range_damages_target() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::new(10.0, 0.0, 10.0));
        let b = spawn_at(&mut registry, Vec3::new(-20.0, 0.0, -20.0));

        let outcomes = CombatSystem::resolve_shot(&mut registry, b, Vec3::new(11.0, 0.0, 10.5));

        assert_eq!(outcomes, vec![ShotOutcome::Hit { target_id: a, hp: 66 }]);
        let target = registry.get(&a).unwrap();
        assert_eq!(target.hp, 66);
        assert!(target.alive);
        assert_eq!(registry.get(&b).unwrap().kills, 0);
    }

    #[test]
    fn shot_out_of_range_misses() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::ZERO);
        let b = spawn_at(&mut registry, Vec3::new(30.0, 0.0, 0.0));

        let outcomes = CombatSystem::resolve_shot(&mut registry, b, Vec3::new(0.0, 0.0, 5.0));

        assert!(outcomes.is_empty());
        assert_eq!(registry.get(&a).unwrap().hp, MAX_HP);
    }

    #[test]
    fn lethal_shot_kills_once_and_credits_shooter() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::ZERO);
        let b = spawn_at(&mut registry, Vec3::new(30.0, 0.0, 0.0));
        registry.get_mut(&a).unwrap().hp = 30;

        let outcomes = CombatSystem::resolve_shot(&mut registry, b, Vec3::ZERO);
        assert_eq!(
            outcomes,
            vec![ShotOutcome::Killed {
                target_id: a,
                shooter_id: b
            }]
        );

        let target = registry.get(&a).unwrap();
        assert_eq!(target.hp, 0);
        assert!(!target.alive);
        assert_eq!(target.deaths, 1);
        assert_eq!(registry.get(&b).unwrap().kills, 1);

        // Dead targets are invulnerable until respawn
        let again = CombatSystem::resolve_shot(&mut registry, b, Vec3::ZERO);
        assert!(again.is_empty());
        assert_eq!(registry.get(&a).unwrap().deaths, 1);
        assert_eq!(registry.get(&b).unwrap().kills, 1);
    }

    #[test]
    fn three_hits_kill_from_full_health() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::ZERO);
        let b = spawn_at(&mut registry, Vec3::new(30.0, 0.0, 0.0));

        CombatSystem::resolve_shot(&mut registry, b, Vec3::ZERO);
        CombatSystem::resolve_shot(&mut registry, b, Vec3::ZERO);
        assert_eq!(registry.get(&a).unwrap().hp, 32);

        let outcomes = CombatSystem::resolve_shot(&mut registry, b, Vec3::ZERO);
        assert!(matches!(outcomes[0], ShotOutcome::Killed { .. }));
    }

    #[test]
    fn self_hits_excluded() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::ZERO);

        let outcomes = CombatSystem::resolve_shot(&mut registry, a, Vec3::ZERO);

        assert!(outcomes.is_empty());
        assert_eq!(registry.get(&a).unwrap().hp, MAX_HP);
    }

    #[test]
    fn one_shot_can_hit_overlapping_targets() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::new(0.5, 0.0, 0.0));
        let c = spawn_at(&mut registry, Vec3::new(-0.5, 0.0, 0.0));
        let b = spawn_at(&mut registry, Vec3::new(30.0, 0.0, 0.0));
        registry.get_mut(&c).unwrap().hp = 10;

        let outcomes = CombatSystem::resolve_shot(&mut registry, b, Vec3::ZERO);

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.contains(&ShotOutcome::Hit { target_id: a, hp: 66 }));
        assert!(outcomes.contains(&ShotOutcome::Killed {
            target_id: c,
            shooter_id: b
        }));
        assert_eq!(registry.get(&b).unwrap().kills, 1);
    }

    #[test]
    fn dead_shooter_resolves_nothing() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::ZERO);
        let b = spawn_at(&mut registry, Vec3::new(30.0, 0.0, 0.0));
        registry.get_mut(&b).unwrap().alive = false;

        assert!(CombatSystem::resolve_shot(&mut registry, b, Vec3::ZERO).is_empty());
        assert_eq!(registry.get(&a).unwrap().hp, MAX_HP);
    }

    #[test]
    fn unknown_shooter_resolves_nothing() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::ZERO);

        assert!(CombatSystem::resolve_shot(&mut registry, Uuid::new_v4(), Vec3::ZERO).is_empty());
        assert_eq!(registry.get(&a).unwrap().hp, MAX_HP);
    }

    #[test]
    fn respawn_restores_dead_participant() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::ZERO);
        {
            let p = registry.get_mut(&a).unwrap();
            p.hp = 0;
            p.alive = false;
        }

        let spot = Vec3::new(12.0, 0.0, -7.0);
        assert!(CombatSystem::respawn(&mut registry, a, spot));

        let p = registry.get(&a).unwrap();
        assert_eq!(p.hp, MAX_HP);
        assert!(p.alive);
        assert_eq!(p.position, spot);
    }

    #[test]
    fn respawn_skips_missing_or_living() {
        let mut registry = SessionRegistry::new();
        let a = spawn_at(&mut registry, Vec3::ZERO);

        assert!(!CombatSystem::respawn(&mut registry, a, Vec3::new(1.0, 0.0, 1.0)));
        assert_eq!(registry.get(&a).unwrap().position, Vec3::ZERO);

        let gone = Uuid::new_v4();
        assert!(!CombatSystem::respawn(&mut registry, gone, Vec3::ZERO));
        assert!(!registry.contains(&gone));
    }
}
