#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battlefield state for the skirmish engine.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_core::{
    Army, Command, Coordinate, Event, Flank, PlacementError, Side, Unit, UnitId, CELL_COUNT,
    GRID_HEIGHT, GRID_WIDTH,
};
use tracing::debug;

/// Width in columns of each deployment band.
const DEPLOYMENT_BAND_WIDTH: i32 = 3;

/// Column splitting the battlefield; neither camp deploys on it.
const CENTRE_COLUMN: i32 = GRID_WIDTH / 2;

/// Represents the authoritative battlefield: both armies and their units.
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    player: Army,
    computer: Army,
    occupancy: Vec<Option<UnitId>>,
}

impl World {
    /// Creates a battlefield from the two opposing armies.
    ///
    /// `player` must be tagged [`Side::Player`] and `computer`
    /// [`Side::Computer`]; unit lookups resolve through those tags.
    ///
    /// Every living unit positioned beforehand occupies its cell. Units still
    /// at [`Coordinate::UNSET`] are pending and wait for [`deploy`] or a
    /// [`Command::PlaceUnit`]. When several units share a cell, the first one
    /// listed holds it (player units first, then recruitment order) and the
    /// others stay off the grid until placed.
    #[must_use]
    pub fn new(player: Army, computer: Army) -> Self {
        debug_assert_eq!(player.side(), Side::Player, "player army has the wrong side tag");
        debug_assert_eq!(
            computer.side(),
            Side::Computer,
            "computer army has the wrong side tag"
        );

        let mut world = Self {
            player,
            computer,
            occupancy: vec![None; CELL_COUNT],
        };

        let positioned: Vec<(UnitId, Coordinate)> = query::units(&world)
            .filter(|unit| unit.is_alive() && unit.cell() != Coordinate::UNSET)
            .map(|unit| (unit.id(), unit.cell()))
            .collect();
        for (unit, cell) in positioned {
            let Some(slot) = cell.index().and_then(|index| world.occupancy.get_mut(index)) else {
                continue;
            };
            match *slot {
                Some(holder) => debug!(?unit, ?holder, ?cell, "cell already held"),
                None => *slot = Some(unit),
            }
        }

        world
    }

    /// Consumes the world, yielding the player and computer armies.
    #[must_use]
    pub fn into_armies(self) -> (Army, Army) {
        (self.player, self.computer)
    }

    fn army_mut(&mut self, side: Side) -> &mut Army {
        match side {
            Side::Player => &mut self.player,
            Side::Computer => &mut self.computer,
        }
    }

    fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.army_mut(id.side()).get_mut(id)
    }

    fn occupant(&self, cell: Coordinate) -> Option<UnitId> {
        let id = cell
            .index()
            .and_then(|index| self.occupancy.get(index).copied().flatten())?;
        query::unit(self, id)
            .filter(|unit| unit.is_alive())
            .map(Unit::id)
    }

    fn occupy(&mut self, unit: UnitId, cell: Coordinate) {
        for slot in self.occupancy.iter_mut() {
            if *slot == Some(unit) {
                *slot = None;
            }
        }
        if let Some(slot) = cell.index().and_then(|index| self.occupancy.get_mut(index)) {
            *slot = Some(unit);
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceUnit { unit, cell } => {
            let reason = if query::unit(world, unit).is_none() {
                Some(PlacementError::MissingUnit)
            } else if !cell.is_on_grid() {
                Some(PlacementError::OutOfBounds)
            } else if world
                .occupant(cell)
                .is_some_and(|occupant| occupant != unit)
            {
                Some(PlacementError::Occupied)
            } else {
                None
            };

            if let Some(reason) = reason {
                out_events.push(Event::PlacementRejected { unit, cell, reason });
                return;
            }

            if let Some(placed) = world.unit_mut(unit) {
                placed.set_cell(cell);
                world.occupy(unit, cell);
                out_events.push(Event::UnitPlaced { unit, cell });
            }
        }
        Command::DealDamage {
            attacker,
            target,
            amount,
        } => {
            let Some(victim) = world.unit_mut(target) else {
                return;
            };
            if !victim.is_alive() {
                return;
            }

            let remaining = victim.take_damage(amount);
            out_events.push(Event::UnitDamaged {
                attacker,
                target,
                amount,
                remaining,
            });
            if remaining <= 0 {
                out_events.push(Event::UnitDefeated { unit: target });
            }
        }
    }
}

/// Reasons a deployment may leave units off the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeploymentError {
    /// A camp fields more units than its flank has cells.
    #[error("{unplaced} {side:?} units found no free cell on their flank")]
    Overflow {
        /// Camp whose units were left over.
        side: Side,
        /// Number of units that could not be placed.
        unplaced: usize,
    },
}

/// Positions every unit of both armies on its camp's flank.
///
/// Previous positions are discarded. Each flank is filled in bands of three
/// columns, starting at the outer edge and moving toward the centre while
/// cells run out. Cells within a band are shuffled with a generator seeded
/// from `seed`, so a fixed seed always yields the same layout.
///
/// # Errors
///
/// Returns [`DeploymentError::Overflow`] for the first camp that does not
/// fit its flank. Its leftover units are reported as rejected placements and
/// stay off the grid; the world must not be used for a battle afterwards.
pub fn deploy(
    world: &mut World,
    seed: u64,
    out_events: &mut Vec<Event>,
) -> Result<(), DeploymentError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut overflow = None;
    world.occupancy.fill(None);

    for side in [Side::Computer, Side::Player] {
        let pending: Vec<UnitId> = query::army(world, side)
            .units()
            .iter()
            .map(Unit::id)
            .collect();
        let mut pending = pending.into_iter().peekable();

        for columns in deployment_bands(side.flank()) {
            if pending.peek().is_none() {
                break;
            }

            let mut cells: Vec<Coordinate> = columns
                .flat_map(|x| (0..GRID_HEIGHT).map(move |y| Coordinate::new(x, y)))
                .collect();
            cells.shuffle(&mut rng);

            for cell in cells {
                if world.occupant(cell).is_some() {
                    continue;
                }
                let Some(unit) = pending.next() else {
                    break;
                };
                apply(world, Command::PlaceUnit { unit, cell }, out_events);
            }
        }

        let mut unplaced = 0;
        for unit in pending {
            unplaced += 1;
            out_events.push(Event::PlacementRejected {
                unit,
                cell: Coordinate::UNSET,
                reason: PlacementError::OutOfBounds,
            });
        }
        if unplaced > 0 && overflow.is_none() {
            overflow = Some(DeploymentError::Overflow { side, unplaced });
        }
    }

    overflow.map_or(Ok(()), Err)
}

fn deployment_bands(flank: Flank) -> impl Iterator<Item = std::ops::Range<i32>> {
    let band_count = (CENTRE_COLUMN + DEPLOYMENT_BAND_WIDTH - 1) / DEPLOYMENT_BAND_WIDTH;
    (0..band_count).map(move |band| {
        let depth = band * DEPLOYMENT_BAND_WIDTH;
        match flank {
            Flank::Left => depth..(depth + DEPLOYMENT_BAND_WIDTH).min(CENTRE_COLUMN),
            Flank::Right => {
                (GRID_WIDTH - depth - DEPLOYMENT_BAND_WIDTH).max(CENTRE_COLUMN + 1)
                    ..GRID_WIDTH - depth
            }
        }
    })
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use skirmish_core::{Army, Side, Unit, UnitId, GRID_HEIGHT, GRID_WIDTH};

    use super::World;

    /// Provides read-only access to the army of the provided camp.
    #[must_use]
    pub fn army(world: &World, side: Side) -> &Army {
        match side {
            Side::Player => &world.player,
            Side::Computer => &world.computer,
        }
    }

    /// Looks up a unit by identifier.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<&Unit> {
        army(world, id.side()).get(id)
    }

    /// Iterates every unit on the battlefield, player units first.
    pub fn units(world: &World) -> impl Iterator<Item = &Unit> {
        world.player.units().iter().chain(world.computer.units())
    }

    /// Number of living units fielded by the provided camp.
    #[must_use]
    pub fn alive_count(world: &World, side: Side) -> usize {
        army(world, side).alive_count()
    }

    /// Reports whether the provided camp still has a living unit.
    #[must_use]
    pub fn has_alive(world: &World, side: Side) -> bool {
        army(world, side).has_alive()
    }

    /// Groups the camp's deployed units by row.
    ///
    /// The result holds one entry per battlefield row, top to bottom. Each row
    /// is a dense slice of columns whose slot `x` holds the camp's unit
    /// standing on `(x, y)`, or `None` when the cell is empty. Dead units keep
    /// their slot until another unit is placed on it; undeployed units are
    /// omitted.
    #[must_use]
    pub fn rows(world: &World, side: Side) -> Vec<Vec<Option<&Unit>>> {
        let width = usize::try_from(GRID_WIDTH).unwrap_or(0);
        let height = usize::try_from(GRID_HEIGHT).unwrap_or(0);
        let mut rows = vec![vec![None; width]; height];

        for (index, occupant) in world.occupancy.iter().enumerate() {
            let Some(id) = occupant.filter(|id| id.side() == side) else {
                continue;
            };
            let slot = rows
                .get_mut(index / width.max(1))
                .and_then(|row| row.get_mut(index % width.max(1)));
            if let Some(slot) = slot {
                *slot = unit(world, id);
            }
        }

        rows
    }
}
