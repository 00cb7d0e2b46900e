#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round-based battle loop that sequences every living unit's turn.
//!
//! The simulator decides who acts and when; what an action does is delegated
//! to an [`AttackProgram`], and every completed action is reported to a
//! [`BattleLog`]. Callers may abort an in-flight battle through an
//! [`Interrupt`], which is honoured before each individual unit turn.

use std::{
    cmp::Ordering,
    num::NonZeroU32,
    sync::{
        atomic::{self, AtomicBool},
        Arc,
    },
};

use skirmish_core::{AttackRecord, Side, Unit, UnitId};
use skirmish_world::{query, World};
use tracing::{debug, info};

/// Capability that performs one unit's action during its turn.
pub trait AttackProgram {
    /// Selects a target for `attacker`, damages it, and returns it.
    ///
    /// Returns `None` when the attacker found nothing to strike.
    fn attack(&mut self, world: &mut World, attacker: UnitId) -> Option<UnitId>;
}

/// Sink receiving one entry per completed action.
pub trait BattleLog {
    /// Records that `attacker` acted against `target`.
    fn log_attack(&mut self, attacker: &Unit, target: Option<&Unit>);
}

impl BattleLog for Vec<AttackRecord> {
    fn log_attack(&mut self, attacker: &Unit, target: Option<&Unit>) {
        self.push(AttackRecord::new(attacker, target));
    }
}

/// Shared cancellation flag for an in-flight simulation.
///
/// Clones observe the same flag, so one clone can be handed to another
/// thread and raised there.
#[derive(Clone, Debug, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Creates a flag that has not been raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that every simulation observing this flag stops.
    pub fn raise(&self) {
        self.0.store(true, atomic::Ordering::Release);
    }

    /// Reports whether the flag has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(atomic::Ordering::Acquire)
    }
}

/// Tunables applied to every simulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    round_limit: Option<NonZeroU32>,
}

impl Config {
    /// Creates a configuration with the provided round limit.
    #[must_use]
    pub const fn new(round_limit: Option<NonZeroU32>) -> Self {
        Self { round_limit }
    }

    /// Number of rounds after which an undecided battle is abandoned.
    #[must_use]
    pub const fn round_limit(&self) -> Option<NonZeroU32> {
        self.round_limit
    }
}

/// Outcome of a battle as observed between turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BattleState {
    /// Both camps still field living units.
    Ongoing,
    /// Only the player's camp has living units left.
    PlayerWins,
    /// Only the computer's camp has living units left.
    ComputerWins,
    /// Neither camp has a living unit.
    Deserted,
}

impl BattleState {
    /// Reports whether no further turns will be taken.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// Summary of a battle that ran to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BattleReport {
    /// Terminal state the battle reached.
    pub state: BattleState,
    /// Number of rounds that were started.
    pub rounds: u32,
    /// Number of actions reported to the battle log.
    pub actions: u32,
}

/// Reasons a simulation may stop before reaching a terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    /// The interrupt was raised or the round limit was reached.
    ///
    /// Army state is indeterminate afterwards; no outcome was decided.
    #[error("battle cancelled after {rounds_completed} completed rounds")]
    Cancelled {
        /// Rounds that finished before the battle was abandoned.
        rounds_completed: u32,
    },
}

/// Drives battles round by round until one camp is wiped out.
#[derive(Debug, Default)]
pub struct BattleSimulator {
    config: Config,
}

impl BattleSimulator {
    /// Creates a simulator using the provided configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration applied to every run.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Runs the battle held by `world` until it reaches a terminal state.
    ///
    /// Every round orders the living units with [`turn_order`]. A unit that
    /// died earlier in the round is skipped, as is a unit whose opponents are
    /// all dead by the time its turn comes. Every other unit acts through
    /// `program`, and the action is reported to `log`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Cancelled`] when `interrupt` is raised
    /// before a unit turn, or when the configured round limit passes without
    /// a decision.
    pub fn simulate<P, L>(
        &mut self,
        world: &mut World,
        program: &mut P,
        log: &mut L,
        interrupt: &Interrupt,
    ) -> Result<BattleReport, SimulationError>
    where
        P: AttackProgram + ?Sized,
        L: BattleLog + ?Sized,
    {
        let mut rounds = 0_u32;
        let mut actions = 0_u32;

        loop {
            let state = battle_state(world);
            if state.is_terminal() {
                info!(?state, rounds, actions, "battle finished");
                return Ok(BattleReport {
                    state,
                    rounds,
                    actions,
                });
            }

            if self
                .config
                .round_limit
                .is_some_and(|limit| rounds >= limit.get())
            {
                info!(rounds, "round limit reached");
                return Err(SimulationError::Cancelled {
                    rounds_completed: rounds,
                });
            }

            let order = turn_order(query::units(world));
            debug!(round = rounds + 1, actors = order.len(), "round started");

            for actor in order {
                if interrupt.is_raised() {
                    info!(rounds, "battle interrupted");
                    return Err(SimulationError::Cancelled {
                        rounds_completed: rounds,
                    });
                }

                if !query::unit(world, actor).is_some_and(Unit::is_alive) {
                    continue;
                }
                if !query::has_alive(world, actor.side().opponent()) {
                    continue;
                }

                let target = program.attack(world, actor);
                if let Some(attacker) = query::unit(world, actor) {
                    let target = target.and_then(|target| query::unit(world, target));
                    log.log_attack(attacker, target);
                    actions = actions.saturating_add(1);
                }
            }

            rounds = rounds.saturating_add(1);
        }
    }
}

/// Orders units so that the strongest base attack acts first.
#[must_use]
pub fn by_attack_descending(left: &Unit, right: &Unit) -> Ordering {
    right.base_attack().cmp(&left.base_attack())
}

/// Living units in acting order.
///
/// The sort is stable, so units with equal attack keep the order in which
/// `units` yielded them.
#[must_use]
pub fn turn_order<'a, I>(units: I) -> Vec<UnitId>
where
    I: IntoIterator<Item = &'a Unit>,
{
    let mut living: Vec<&Unit> = units.into_iter().filter(|unit| unit.is_alive()).collect();
    living.sort_by(|left, right| by_attack_descending(left, right));
    living.into_iter().map(Unit::id).collect()
}

/// Classifies the battle from the living units of each camp.
#[must_use]
pub fn battle_state(world: &World) -> BattleState {
    match (
        query::has_alive(world, Side::Player),
        query::has_alive(world, Side::Computer),
    ) {
        (true, true) => BattleState::Ongoing,
        (true, false) => BattleState::PlayerWins,
        (false, true) => BattleState::ComputerWins,
        (false, false) => BattleState::Deserted,
    }
}
