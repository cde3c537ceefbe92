//! Headless skill sandbox.
//!
//! Drives a [`SkillExecutor`](skill_runtime::SkillExecutor) over a small
//! arena skirmish on a fixed tick and prints every lifecycle event.
//!
//! ```bash
//! # 20 Hz, human-readable
//! cargo run -p skill-sandbox
//!
//! # As fast as possible, JSON lines, fixed seed
//! cargo run -p skill-sandbox -- --fast --json --seed 7
//! ```
//!
//! Executor settings come from the environment (`SKILL_SAFETY_TIMEOUT`,
//! `SKILL_BASE_SEED`, `SKILL_EVENT_HISTORY`), optionally via a `.env` file.
mod scenario;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use skill_runtime::{ExecutorConfig, SkillEvent};
use tokio::time::MissedTickBehavior;

use scenario::{GOBLINS, HEROES, Scenario};

/// Run a skill composition skirmish
#[derive(Parser, Debug)]
#[command(name = "skill-sandbox")]
#[command(about = "Headless arena for the skill executor", long_about = None)]
#[command(version)]
struct Args {
    /// Maximum number of ticks to simulate
    #[arg(short = 'n', long, default_value = "1200")]
    ticks: u32,

    /// Ticks per second
    #[arg(long, default_value = "20")]
    tick_rate: u32,

    /// Base RNG seed (overrides SKILL_BASE_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Do not wait between ticks
    #[arg(long)]
    fast: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = ExecutorConfig::from_env().context("invalid executor configuration")?;
    if let Some(seed) = args.seed {
        config.base_seed = seed;
    }
    tracing::info!(
        seed = config.base_seed,
        timeout = config.safety_timeout,
        "Starting skill sandbox"
    );

    let tick_rate = args.tick_rate.max(1);
    let dt = 1.0 / tick_rate as f32;
    let mut scenario = Scenario::new(config).context("failed to build scenario")?;

    let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_tick = 0;
    for tick in 0..args.ticks {
        if !args.fast {
            interval.tick().await;
        }
        for event in scenario.tick(dt) {
            report(tick, &event, args.json)?;
        }
        last_tick = tick;
        if scenario.is_over() {
            break;
        }
    }

    let heroes = scenario.alive(HEROES);
    let goblins = scenario.alive(GOBLINS);
    tracing::info!(ticks = last_tick + 1, heroes, goblins, "Sandbox finished");
    if !args.json {
        println!();
        println!("after {:.2}s: {heroes} heroes, {goblins} goblins", (last_tick + 1) as f32 * dt);
        for (entity, faction, health) in scenario.roster() {
            println!("  {entity} (faction {}) {health:.1} hp", faction.0);
        }
    }

    Ok(())
}

fn report(tick: u32, event: &SkillEvent, json: bool) -> Result<()> {
    if json {
        let line = serde_json::json!({ "tick": tick, "event": event });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    let line = match event {
        SkillEvent::Started {
            cast,
            targets,
            casting,
        } => {
            let verb = if *casting { "begins casting" } else { "casts" };
            format!("{} {verb} {} on {} target(s)", cast.owner, cast.skill, targets.len())
        }
        SkillEvent::Completed { cast } => format!("{} {} completed", cast.owner, cast.skill),
        SkillEvent::Failed { cast, reason } => {
            format!("{} {} failed: {reason:?}", cast.owner, cast.skill)
        }
        SkillEvent::Interrupted {
            cast,
            cause,
            refunded,
        } => format!(
            "{} {} interrupted ({cause:?}{})",
            cast.owner,
            cast.skill,
            if *refunded { ", refunded" } else { "" }
        ),
        SkillEvent::CooldownFinished { skill, owner, .. } => {
            format!("{owner} {skill} ready")
        }
    };
    println!("[{tick:>5}] {line}");
    Ok(())
}
