#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks the exposed unit of every row of a defending formation.

use skirmish_core::{Flank, Unit};

/// Selects the single attackable unit of each row.
///
/// `rows` lists the defending camp's units grouped by row; empty slots and
/// dead units are skipped. A formation standing on [`Flank::Left`] exposes its
/// living unit with the highest column, one on [`Flank::Right`] its living unit
/// with the lowest column. Rows without a living unit contribute nothing, and
/// the result preserves row order.
#[must_use]
pub fn exposed_units<'a, R>(rows: &[R], flank: Flank) -> Vec<&'a Unit>
where
    R: AsRef<[Option<&'a Unit>]>,
{
    let mut exposed = Vec::new();

    for row in rows {
        let mut front: Option<&'a Unit> = None;

        for unit in row.as_ref().iter().copied().flatten() {
            if !unit.is_alive() {
                continue;
            }

            match front {
                Some(current) if !precedes(unit, current, flank) => {}
                _ => front = Some(unit),
            }
        }

        if let Some(unit) = front {
            exposed.push(unit);
        }
    }

    exposed
}

/// Reports whether `candidate` stands closer to the enemy than `current`.
///
/// Units sharing a column keep the one encountered first.
fn precedes(candidate: &Unit, current: &Unit, flank: Flank) -> bool {
    match flank {
        Flank::Left => candidate.cell().x() > current.cell().x(),
        Flank::Right => candidate.cell().x() < current.cell().x(),
    }
}
