#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that composes two armies and simulates their battle.

mod roster;

use std::{
    io::{self, Write},
    num::NonZeroU32,
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use skirmish_core::{Army, AttackRecord, Event, Side, Unit};
use skirmish_system_army_composer::ArmyComposer;
use skirmish_system_battle::{
    BattleLog, BattleReport, BattleSimulator, BattleState, Config, Interrupt,
};
use skirmish_system_combat::FrontLineAssault;
use skirmish_world::{self as world, World};
use tracing::{info, warn};

/// Simulates a battle between two armies composed from a unit roster.
#[derive(Debug, Parser)]
#[command(name = "skirmish")]
struct Args {
    /// TOML roster of unit templates; the bundled roster is used when omitted.
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Point budget for the player's army.
    #[arg(long, default_value_t = 150)]
    player_points: i32,

    /// Point budget for the computer's army.
    #[arg(long, default_value_t = 150)]
    computer_points: i32,

    /// Seed for the deployment layout.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Abandon the battle after this many undecided rounds.
    #[arg(long)]
    round_limit: Option<NonZeroU32>,

    /// Print every action as a JSON line instead of a text summary.
    #[arg(long)]
    json: bool,
}

/// Battle log that keeps every record and traces each action as it happens.
#[derive(Debug, Default)]
struct ConsoleLog {
    records: Vec<AttackRecord>,
}

impl BattleLog for ConsoleLog {
    fn log_attack(&mut self, attacker: &Unit, target: Option<&Unit>) {
        let record = AttackRecord::new(attacker, target);
        match (&record.target_name, record.target_health) {
            (Some(target), Some(health)) => {
                info!(attacker = %record.attacker_name, %target, health, "attack");
            }
            _ => info!(attacker = %record.attacker_name, "no target in reach"),
        }
        self.records.push(record);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let templates = roster::load(args.roster.as_deref())?;

    let player = ArmyComposer::new(Side::Player).generate(&templates, args.player_points);
    let computer = ArmyComposer::computer().generate(&templates, args.computer_points);
    log_army(&player);
    log_army(&computer);

    let mut world = World::new(player, computer);
    let mut events = Vec::new();
    let deployed = world::deploy(&mut world, args.seed, &mut events);
    for event in &events {
        if let Event::PlacementRejected { unit, reason, .. } = event {
            warn!(?unit, ?reason, "unit could not be deployed");
        }
    }
    deployed.context("armies do not fit the battlefield")?;

    let mut simulator = BattleSimulator::new(Config::new(args.round_limit));
    let mut log = ConsoleLog::default();
    let report = simulator
        .simulate(
            &mut world,
            &mut FrontLineAssault::new(),
            &mut log,
            &Interrupt::new(),
        )
        .context("battle ended without a decision")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        for record in &log.records {
            serde_json::to_writer(&mut out, record).context("failed to encode attack record")?;
            writeln!(out)?;
        }
    } else {
        writeln!(out, "{}", summary(&report))?;
    }

    Ok(())
}

fn log_army(army: &Army) {
    info!(
        side = ?army.side(),
        units = army.len(),
        points = army.points(),
        "army composed"
    );
}

fn summary(report: &BattleReport) -> String {
    let outcome = match report.state {
        BattleState::PlayerWins => "player wins",
        BattleState::ComputerWins => "computer wins",
        BattleState::Deserted => "no army took the field",
        BattleState::Ongoing => "battle undecided",
    };
    format!(
        "{outcome} after {} rounds and {} actions",
        report.rounds, report.actions
    )
}
