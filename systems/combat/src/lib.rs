#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Default attack program: strike the exposed front line of the enemy camp.

use skirmish_core::{AttackType, Command, Event, Unit, UnitId};
use skirmish_system_battle::AttackProgram;
use skirmish_system_front_line::exposed_units;
use skirmish_system_path_finder::PathFinder;
use skirmish_world::{self as world, query, World};
use tracing::debug;

/// Attack program shared by every unit of both camps.
///
/// Units never move: a melee attacker only needs a free route to its target,
/// while a ranged attacker may strike any exposed unit.
#[derive(Debug, Default)]
pub struct FrontLineAssault {
    path_finder: PathFinder,
    events: Vec<Event>,
}

impl FrontLineAssault {
    /// Creates the program with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chooses the unit `attacker` would strike, without striking it.
    ///
    /// Only exposed enemy units are eligible. Ranged attackers pick the
    /// closest one by Chebyshev distance; melee attackers pick the one with
    /// the shortest path, treating every other living unit as an obstacle.
    /// Ties go to the target in the earliest row.
    pub fn select_target(&mut self, world: &World, attacker: UnitId) -> Option<UnitId> {
        let unit = query::unit(world, attacker).filter(|unit| unit.is_alive())?;
        let enemy = unit.side().opponent();
        let rows = query::rows(world, enemy);
        let exposed = exposed_units(&rows, enemy.flank());

        match unit.attack_type() {
            AttackType::Ranged => exposed
                .into_iter()
                .min_by_key(|target| unit.cell().chebyshev_distance(target.cell()))
                .map(Unit::id),
            AttackType::Melee => {
                let mut best: Option<(usize, UnitId)> = None;
                for target in exposed {
                    let path = self
                        .path_finder
                        .find_path(unit, target, query::units(world));
                    if path.is_empty() {
                        continue;
                    }
                    if best.map_or(true, |(length, _)| path.len() < length) {
                        best = Some((path.len(), target.id()));
                    }
                }
                best.map(|(_, target)| target)
            }
        }
    }
}

impl AttackProgram for FrontLineAssault {
    fn attack(&mut self, world: &mut World, attacker: UnitId) -> Option<UnitId> {
        let target = self.select_target(world, attacker)?;
        let amount = damage(query::unit(world, attacker)?, query::unit(world, target)?);

        self.events.clear();
        world::apply(
            world,
            Command::DealDamage {
                attacker,
                target,
                amount,
            },
            &mut self.events,
        );

        for event in &self.events {
            match event {
                Event::UnitDamaged { remaining, .. } => {
                    debug!(?attacker, ?target, amount, remaining, "unit struck");
                }
                Event::UnitDefeated { unit } => debug!(?unit, "unit defeated"),
                _ => {}
            }
        }

        Some(target)
    }
}

/// Health removed when `attacker` strikes `target`.
///
/// The attacker's base attack is scaled by its own bonus for its attack type
/// and divided by the target's defence bonus for the same type, then rounded
/// down. A non-positive defence bonus counts as neutral. Every blow removes
/// at least one point of health.
#[must_use]
pub fn damage(attacker: &Unit, target: &Unit) -> u32 {
    let category = attacker.attack_type();
    let defence = target.defence_bonuses().multiplier(category);
    let defence = if defence > 0.0 { defence } else { 1.0 };
    let scaled = f64::from(attacker.base_attack()) * attacker.attack_bonuses().multiplier(category)
        / defence;

    // Float casts saturate and map NaN to zero.
    (scaled.floor() as u32).max(1)
}
