#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the skirmish engine.
//!
//! This crate defines the vocabulary every other crate speaks: the fixed
//! battlefield grid, unit templates and their instantiated combatants, the
//! armies that own them, and the [`Command`]/[`Event`] surface through which
//! systems mutate the authoritative world. Systems read armies through the
//! world's query functions and respond exclusively with new commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of columns laid out on the battlefield.
pub const GRID_WIDTH: i32 = 27;

/// Number of rows laid out on the battlefield.
pub const GRID_HEIGHT: i32 = 21;

/// Total number of cells on the battlefield.
pub const CELL_COUNT: usize = (GRID_WIDTH * GRID_HEIGHT) as usize;

/// Maximum number of units of a single template type one army may field.
pub const MAX_UNITS_PER_TYPE: usize = 11;

/// Neighbour offsets as `(dx, dy)` pairs in their fixed enumeration order.
///
/// Breadth-first searches expand neighbours in exactly this order, which makes
/// the choice among equally short paths reproducible between runs.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Location of a single battlefield cell.
///
/// Components are signed so that out-of-range input can be represented and
/// rejected instead of wrapping around.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    x: i32,
    y: i32,
}

impl Coordinate {
    /// Placeholder assigned to units that have not been deployed yet.
    pub const UNSET: Self = Self::new(0, 0);

    /// Creates a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Reports whether the coordinate lies within the battlefield.
    #[must_use]
    pub const fn is_on_grid(&self) -> bool {
        self.x >= 0 && self.x < GRID_WIDTH && self.y >= 0 && self.y < GRID_HEIGHT
    }

    /// Row-major offset of the cell within a dense battlefield array.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        if !self.is_on_grid() {
            return None;
        }

        let x = usize::try_from(self.x).ok()?;
        let y = usize::try_from(self.y).ok()?;
        let width = usize::try_from(GRID_WIDTH).ok()?;
        y.checked_mul(width)?.checked_add(x)
    }

    /// Inverse of [`Coordinate::index`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= CELL_COUNT {
            return None;
        }

        let width = usize::try_from(GRID_WIDTH).ok()?;
        let x = i32::try_from(index % width).ok()?;
        let y = i32::try_from(index / width).ok()?;
        Some(Self::new(x, y))
    }

    /// Coordinate displaced by the provided offset.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// On-grid neighbours in [`NEIGHBOR_OFFSETS`] order.
    pub fn neighbors(self) -> impl Iterator<Item = Coordinate> {
        NEIGHBOR_OFFSETS
            .into_iter()
            .map(move |(dx, dy)| self.offset(dx, dy))
            .filter(Coordinate::is_on_grid)
    }

    /// Number of 8-directional steps separating two cells on an empty grid.
    #[must_use]
    pub fn chebyshev_distance(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Reports whether the two cells touch orthogonally or diagonally.
    #[must_use]
    pub fn is_adjacent_to(self, other: Coordinate) -> bool {
        self.chebyshev_distance(other) == 1
    }
}

/// The two opposing camps of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Army assembled by the human player.
    Player,
    /// Army assembled by the computer.
    Computer,
}

impl Side {
    /// Returns the camp fighting against this one.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Computer,
            Self::Computer => Self::Player,
        }
    }

    /// Flank of the battlefield this camp deploys on.
    ///
    /// The computer holds the low columns and the player the high columns.
    #[must_use]
    pub const fn flank(self) -> Flank {
        match self {
            Self::Player => Flank::Right,
            Self::Computer => Flank::Left,
        }
    }
}

/// Half of the battlefield along the x-axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flank {
    /// Low columns; a formation here faces its enemy with its highest column.
    Left,
    /// High columns; a formation here faces its enemy with its lowest column.
    Right,
}

/// Delivery method of a unit's attack, doubling as its damage category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackType {
    /// Close combat; the attacker must be able to reach its target.
    Melee,
    /// Missile fire; any exposed target may be struck.
    Ranged,
}

/// Damage multipliers keyed by damage category.
///
/// Categories missing from the table use a neutral multiplier of `1.0`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BonusTable(BTreeMap<AttackType, f64>);

impl BonusTable {
    /// Creates an empty table where every category is neutral.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table with the multiplier for `category` replaced.
    #[must_use]
    pub fn with(mut self, category: AttackType, multiplier: f64) -> Self {
        let _ = self.0.insert(category, multiplier);
        self
    }

    /// Multiplier applied for the provided damage category.
    #[must_use]
    pub fn multiplier(&self, category: AttackType) -> f64 {
        self.0.get(&category).copied().unwrap_or(1.0)
    }
}

/// Immutable prototype describing one unit type.
///
/// Values are consumed verbatim; negative costs or health are not rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Name of the unit type, shared by every instance.
    pub unit_type: String,
    /// Health each instance starts with.
    pub health: i32,
    /// Damage dealt per attack before bonuses.
    pub base_attack: i32,
    /// Points spent to recruit one instance.
    pub cost: i32,
    /// Delivery method of the unit's attack.
    pub attack_type: AttackType,
    /// Multipliers applied to damage this unit deals.
    #[serde(default)]
    pub attack_bonuses: BonusTable,
    /// Divisors applied to damage this unit receives.
    #[serde(default)]
    pub defence_bonuses: BonusTable,
}

/// Identifier of a unit: its camp plus its position in that camp's army.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    side: Side,
    index: u32,
}

impl UnitId {
    /// Creates a new unit identifier.
    #[must_use]
    pub const fn new(side: Side, index: u32) -> Self {
        Self { side, index }
    }

    /// Camp owning the unit.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Position of the unit within its army.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }
}

/// Instantiated combatant with its own mutable health and position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    name: String,
    unit_type: String,
    health: i32,
    base_attack: i32,
    cost: i32,
    attack_type: AttackType,
    attack_bonuses: BonusTable,
    defence_bonuses: BonusTable,
    cell: Coordinate,
}

impl Unit {
    /// Instantiates a fresh copy of the template's stats at [`Coordinate::UNSET`].
    #[must_use]
    pub fn from_template(template: &UnitTemplate, id: UnitId, name: String) -> Self {
        Self {
            id,
            name,
            unit_type: template.unit_type.clone(),
            health: template.health,
            base_attack: template.base_attack,
            cost: template.cost,
            attack_type: template.attack_type,
            attack_bonuses: template.attack_bonuses.clone(),
            defence_bonuses: template.defence_bonuses.clone(),
            cell: Coordinate::UNSET,
        }
    }

    /// Identifier of the unit.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Camp the unit fights for.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.id.side()
    }

    /// Unique name of the unit within its army.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template type the unit was instantiated from.
    #[must_use]
    pub fn unit_type(&self) -> &str {
        &self.unit_type
    }

    /// Remaining health; zero or below means the unit is dead.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Damage dealt per attack before bonuses.
    #[must_use]
    pub const fn base_attack(&self) -> i32 {
        self.base_attack
    }

    /// Points paid to recruit the unit.
    #[must_use]
    pub const fn cost(&self) -> i32 {
        self.cost
    }

    /// Delivery method of the unit's attack.
    #[must_use]
    pub const fn attack_type(&self) -> AttackType {
        self.attack_type
    }

    /// Multipliers applied to damage this unit deals.
    #[must_use]
    pub const fn attack_bonuses(&self) -> &BonusTable {
        &self.attack_bonuses
    }

    /// Divisors applied to damage this unit receives.
    #[must_use]
    pub const fn defence_bonuses(&self) -> &BonusTable {
        &self.defence_bonuses
    }

    /// Cell the unit currently stands on.
    #[must_use]
    pub const fn cell(&self) -> Coordinate {
        self.cell
    }

    /// Reports whether the unit still has health left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Moves the unit onto the provided cell.
    pub fn set_cell(&mut self, cell: Coordinate) {
        self.cell = cell;
    }

    /// Reduces health by `amount` and returns the health left.
    pub fn take_damage(&mut self, amount: u32) -> i32 {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.health = self.health.saturating_sub(amount);
        self.health
    }
}

/// Ordered roster of units fielded by one camp.
///
/// Insertion order is meaningful: it breaks ties wherever units are ranked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Army {
    side: Side,
    units: Vec<Unit>,
    points: i32,
}

impl Army {
    /// Creates an empty army for the provided camp.
    #[must_use]
    pub const fn new(side: Side) -> Self {
        Self {
            side,
            units: Vec::new(),
            points: 0,
        }
    }

    /// Camp fielding the army.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Units in insertion order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Total cost of every recruited unit.
    #[must_use]
    pub const fn points(&self) -> i32 {
        self.points
    }

    /// Number of units in the army, dead or alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Reports whether the army holds no units at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of recruited units instantiated from `unit_type`.
    #[must_use]
    pub fn type_count(&self, unit_type: &str) -> usize {
        self.units
            .iter()
            .filter(|unit| unit.unit_type == unit_type)
            .count()
    }

    /// Instantiates one unit from `template` and appends it to the army.
    ///
    /// The unit is named `<type>_<ordinal>` where the ordinal counts earlier
    /// recruits of the same type. Returns `None` once the army already fields
    /// [`MAX_UNITS_PER_TYPE`] units of that type.
    pub fn recruit(&mut self, template: &UnitTemplate) -> Option<UnitId> {
        let ordinal = self.type_count(&template.unit_type);
        if ordinal >= MAX_UNITS_PER_TYPE {
            return None;
        }

        let index = u32::try_from(self.units.len()).ok()?;
        let id = UnitId::new(self.side, index);
        let name = format!("{}_{ordinal}", template.unit_type);
        self.units.push(Unit::from_template(template, id, name));
        self.points = self.points.saturating_add(template.cost);
        Some(id)
    }

    /// Looks up a unit of this army by identifier.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        if id.side() != self.side {
            return None;
        }

        self.units.get(usize::try_from(id.index()).ok()?)
    }

    /// Mutable lookup of a unit of this army by identifier.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        if id.side() != self.side {
            return None;
        }

        self.units.get_mut(usize::try_from(id.index()).ok()?)
    }

    /// Iterator over the living units in insertion order.
    pub fn alive_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|unit| unit.is_alive())
    }

    /// Number of living units.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive_units().count()
    }

    /// Reports whether at least one unit is still alive.
    #[must_use]
    pub fn has_alive(&self) -> bool {
        self.alive_units().next().is_some()
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests that a unit be positioned on the provided cell.
    PlaceUnit {
        /// Unit to position.
        unit: UnitId,
        /// Destination cell.
        cell: Coordinate,
    },
    /// Requests that a unit lose health as the result of an attack.
    DealDamage {
        /// Unit delivering the blow.
        attacker: UnitId,
        /// Unit receiving the blow.
        target: UnitId,
        /// Health removed from the target.
        amount: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Confirms that a unit now stands on a cell.
    UnitPlaced {
        /// Unit that was positioned.
        unit: UnitId,
        /// Cell the unit occupies.
        cell: Coordinate,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Unit named in the request.
        unit: UnitId,
        /// Cell named in the request.
        cell: Coordinate,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a unit lost health.
    UnitDamaged {
        /// Unit that delivered the blow.
        attacker: UnitId,
        /// Unit that received the blow.
        target: UnitId,
        /// Health removed by the blow.
        amount: u32,
        /// Health left after the blow.
        remaining: i32,
    },
    /// Announces that a unit's health dropped to zero or below.
    UnitDefeated {
        /// Unit that died.
        unit: UnitId,
    },
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// No unit with the provided identifier exists.
    MissingUnit,
    /// The requested cell lies outside the battlefield.
    OutOfBounds,
    /// Another living unit already stands on the requested cell.
    Occupied,
}

/// Serialisable account of one unit's action in a battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRecord {
    /// Unit that acted.
    pub attacker: UnitId,
    /// Name of the unit that acted.
    pub attacker_name: String,
    /// Unit that was struck, if a target was found.
    pub target: Option<UnitId>,
    /// Name of the unit that was struck.
    pub target_name: Option<String>,
    /// Health the target was left with.
    pub target_health: Option<i32>,
}

impl AttackRecord {
    /// Captures the state of an attacker and its optional target.
    #[must_use]
    pub fn new(attacker: &Unit, target: Option<&Unit>) -> Self {
        Self {
            attacker: attacker.id(),
            attacker_name: attacker.name().to_owned(),
            target: target.map(Unit::id),
            target_name: target.map(|unit| unit.name().to_owned()),
            target_health: target.map(Unit::health),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn template(unit_type: &str, cost: i32) -> UnitTemplate {
        UnitTemplate {
            unit_type: unit_type.to_owned(),
            health: 10,
            base_attack: 3,
            cost,
            attack_type: AttackType::Melee,
            attack_bonuses: BonusTable::new(),
            defence_bonuses: BonusTable::new(),
        }
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn grid_bounds_are_exclusive() {
        assert!(Coordinate::new(0, 0).is_on_grid());
        assert!(Coordinate::new(26, 20).is_on_grid());
        assert!(!Coordinate::new(27, 0).is_on_grid());
        assert!(!Coordinate::new(0, 21).is_on_grid());
        assert!(!Coordinate::new(-1, 3).is_on_grid());
    }

    #[test]
    fn index_round_trips_for_every_cell() {
        for index in 0..CELL_COUNT {
            let cell = Coordinate::from_index(index).expect("in range");
            assert_eq!(cell.index(), Some(index));
        }
        assert_eq!(Coordinate::from_index(CELL_COUNT), None);
        assert_eq!(Coordinate::new(-1, 0).index(), None);
    }

    #[test]
    fn neighbors_follow_fixed_order_and_stay_on_grid() {
        let inner: Vec<_> = Coordinate::new(5, 5).neighbors().collect();
        assert_eq!(
            inner,
            vec![
                Coordinate::new(4, 4),
                Coordinate::new(4, 5),
                Coordinate::new(4, 6),
                Coordinate::new(5, 4),
                Coordinate::new(5, 6),
                Coordinate::new(6, 4),
                Coordinate::new(6, 5),
                Coordinate::new(6, 6),
            ]
        );

        let corner: Vec<_> = Coordinate::new(0, 0).neighbors().collect();
        assert_eq!(
            corner,
            vec![
                Coordinate::new(0, 1),
                Coordinate::new(1, 0),
                Coordinate::new(1, 1)
            ]
        );
    }

    #[test]
    fn chebyshev_distance_counts_diagonal_steps_once() {
        let origin = Coordinate::new(1, 1);
        assert_eq!(origin.chebyshev_distance(Coordinate::new(4, 3)), 3);
        assert_eq!(Coordinate::new(4, 3).chebyshev_distance(origin), 3);
        assert!(origin.is_adjacent_to(Coordinate::new(2, 2)));
        assert!(!origin.is_adjacent_to(origin));
    }

    #[test]
    fn sides_oppose_each_other_on_distinct_flanks() {
        assert_eq!(Side::Player.opponent(), Side::Computer);
        assert_eq!(Side::Computer.opponent(), Side::Player);
        assert_eq!(Side::Computer.flank(), Flank::Left);
        assert_eq!(Side::Player.flank(), Flank::Right);
    }

    #[test]
    fn missing_bonus_categories_are_neutral() {
        let table = BonusTable::new().with(AttackType::Ranged, 1.5);
        assert!((table.multiplier(AttackType::Ranged) - 1.5).abs() < f64::EPSILON);
        assert!((table.multiplier(AttackType::Melee) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn recruit_names_units_by_type_ordinal_and_tracks_points() {
        let mut army = Army::new(Side::Computer);
        let pike = template("Pikeman", 4);
        let bow = template("Archer", 6);

        let first = army.recruit(&pike).expect("room");
        let _ = army.recruit(&bow).expect("room");
        let third = army.recruit(&pike).expect("room");

        assert_eq!(first, UnitId::new(Side::Computer, 0));
        assert_eq!(third, UnitId::new(Side::Computer, 2));
        let names: Vec<_> = army.units().iter().map(Unit::name).collect();
        assert_eq!(names, vec!["Pikeman_0", "Archer_0", "Pikeman_1"]);
        assert_eq!(army.points(), 14);
        assert_eq!(army.type_count("Pikeman"), 2);
    }

    #[test]
    fn recruit_refuses_twelfth_unit_of_a_type() {
        let mut army = Army::new(Side::Player);
        let pike = template("Pikeman", 1);
        for _ in 0..MAX_UNITS_PER_TYPE {
            assert!(army.recruit(&pike).is_some());
        }

        assert_eq!(army.recruit(&pike), None);
        assert_eq!(army.len(), MAX_UNITS_PER_TYPE);
        assert_eq!(army.points(), 11);
    }

    #[test]
    fn recruits_are_independent_copies() {
        let mut army = Army::new(Side::Player);
        let pike = template("Pikeman", 1);
        let first = army.recruit(&pike).expect("room");
        let second = army.recruit(&pike).expect("room");

        let remaining = army.get_mut(first).expect("exists").take_damage(25);

        assert_eq!(remaining, -15);
        assert!(!army.get(first).expect("exists").is_alive());
        assert_eq!(army.get(second).expect("exists").health(), 10);
        assert_eq!(army.alive_count(), 1);
        assert_eq!(pike.health, 10);
    }

    #[test]
    fn lookups_reject_foreign_identifiers() {
        let mut army = Army::new(Side::Player);
        let _ = army.recruit(&template("Pikeman", 1));

        assert!(army.get(UnitId::new(Side::Computer, 0)).is_none());
        assert!(army.get(UnitId::new(Side::Player, 3)).is_none());
    }

    #[test]
    fn attack_record_round_trips_through_bincode() {
        let mut army = Army::new(Side::Player);
        let id = army.recruit(&template("Pikeman", 1)).expect("room");
        let unit = army.get(id).expect("exists");
        assert_round_trip(&AttackRecord::new(unit, Some(unit)));
    }

    #[test]
    fn template_deserializes_with_default_bonuses() {
        let template: UnitTemplate = serde_json::from_str(
            r#"{"unit_type":"Archer","health":30,"base_attack":8,"cost":20,"attack_type":"ranged"}"#,
        )
        .expect("valid template");

        assert_eq!(template.attack_type, AttackType::Ranged);
        assert_eq!(template.attack_bonuses, BonusTable::new());
    }
}
