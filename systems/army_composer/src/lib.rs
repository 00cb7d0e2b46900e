#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Greedy system that assembles an army from unit templates under a point budget.

use std::cmp::Ordering;

use skirmish_core::{Army, Side, UnitTemplate};
use tracing::debug;

/// Pure system that recruits the most cost-efficient templates first.
///
/// Composition is a heuristic, not an exact knapsack solver: it never
/// backtracks and may leave budget unspent when nothing else fits.
#[derive(Clone, Copy, Debug)]
pub struct ArmyComposer {
    side: Side,
}

impl ArmyComposer {
    /// Creates a composer that builds armies for the provided camp.
    #[must_use]
    pub const fn new(side: Side) -> Self {
        Self { side }
    }

    /// Creates a composer that builds the computer's army.
    #[must_use]
    pub const fn computer() -> Self {
        Self::new(Side::Computer)
    }

    /// Builds an army whose total cost never exceeds `max_points`.
    ///
    /// Templates are ranked with [`by_efficiency`]. The ranked list is then
    /// swept repeatedly; each sweep recruits one unit of every template that
    /// is below the per-type limit and still affordable. Composition stops
    /// after the first sweep that recruits nothing.
    #[must_use]
    pub fn generate(&self, templates: &[UnitTemplate], max_points: i32) -> Army {
        let mut ranked: Vec<&UnitTemplate> = templates.iter().collect();
        ranked.sort_by(|left, right| by_efficiency(left, right));

        let mut army = Army::new(self.side);
        loop {
            let mut recruited_any = false;

            for template in &ranked {
                if army.points().saturating_add(template.cost) > max_points {
                    continue;
                }

                let Some(id) = army.recruit(template) else {
                    continue;
                };
                recruited_any = true;

                if let Some(unit) = army.get(id) {
                    debug!(
                        side = ?self.side,
                        unit = unit.name(),
                        cost = unit.cost(),
                        points = army.points(),
                        "recruited unit"
                    );
                }
            }

            if !recruited_any {
                break;
            }
        }

        army
    }
}

impl Default for ArmyComposer {
    fn default() -> Self {
        Self::computer()
    }
}

/// Attack delivered per point spent.
#[must_use]
pub fn attack_efficiency(template: &UnitTemplate) -> f64 {
    f64::from(template.base_attack) / f64::from(template.cost)
}

/// Health bought per point spent.
#[must_use]
pub fn health_efficiency(template: &UnitTemplate) -> f64 {
    f64::from(template.health) / f64::from(template.cost)
}

/// Ranks templates from most to least efficient.
///
/// Higher [`attack_efficiency`] comes first; equal attack efficiency falls
/// back to higher [`health_efficiency`]. Templates equal on both keep their
/// relative order under a stable sort.
#[must_use]
pub fn by_efficiency(left: &UnitTemplate, right: &UnitTemplate) -> Ordering {
    attack_efficiency(right)
        .total_cmp(&attack_efficiency(left))
        .then_with(|| health_efficiency(right).total_cmp(&health_efficiency(left)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::{AttackType, BonusTable};

    fn template(unit_type: &str, health: i32, base_attack: i32, cost: i32) -> UnitTemplate {
        UnitTemplate {
            unit_type: unit_type.to_owned(),
            health,
            base_attack,
            cost,
            attack_type: AttackType::Melee,
            attack_bonuses: BonusTable::new(),
            defence_bonuses: BonusTable::new(),
        }
    }

    #[test]
    fn efficiency_ratios_are_real_valued() {
        let archer = template("Archer", 50, 7, 2);
        assert!((attack_efficiency(&archer) - 3.5).abs() < f64::EPSILON);
        assert!((health_efficiency(&archer) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn higher_attack_efficiency_ranks_first() {
        let strong = template("Strong", 10, 9, 3);
        let weak = template("Weak", 100, 2, 1);

        assert_eq!(by_efficiency(&strong, &weak), Ordering::Less);
        assert_eq!(by_efficiency(&weak, &strong), Ordering::Greater);
    }

    #[test]
    fn health_efficiency_breaks_attack_ties() {
        let sturdy = template("Sturdy", 30, 4, 2);
        let frail = template("Frail", 50, 10, 5);

        assert_eq!(by_efficiency(&sturdy, &frail), Ordering::Less);
        assert_eq!(by_efficiency(&sturdy, &sturdy), Ordering::Equal);
    }

    #[test]
    fn empty_template_list_yields_empty_army() {
        let army = ArmyComposer::computer().generate(&[], 1_000);

        assert!(army.is_empty());
        assert_eq!(army.points(), 0);
        assert_eq!(army.side(), Side::Computer);
    }
}
