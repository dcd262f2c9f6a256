use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use darkside::config::{DefenderArchetype, GameConfig};
use darkside::controller::SessionSetup;
use darkside::leaderboard::LeaderboardEntry;
use darkside::playtest::{Autopilot, AutopilotMode, DEFAULT_FRAME_MS, DefenseLogic};
use darkside::resolve_data_dir;
use darkside::session::SessionStore;
use engine::HeadlessRunner;
use engine::persist::FileStore;

#[derive(Debug, Parser)]
#[command(name = "darkside-playtest")]
#[command(about = "Play headless defensive sessions with a bot and record the results")]
struct Cli {
    /// Overrides DARKSIDE_DATA_DIR and the XDG default.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Run {
        #[arg(long)]
        week: Option<u32>,
        #[arg(long, default_value = "db")]
        defender: DefenderArchetype,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Tap on a random frame with this probability instead of timing taps.
        #[arg(long)]
        random: Option<f64>,
        #[arg(long, default_value_t = DEFAULT_FRAME_MS)]
        frame_ms: u32,
        #[arg(long, default_value_t = 500_000)]
        max_steps: usize,
        /// Submit the score to the leaderboard under these initials.
        #[arg(long)]
        initials: Option<String>,
        #[arg(long, default_value_t = 0)]
        jersey: u32,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    Leaderboard,
    Reset,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let dir = match cli.data_dir {
        Some(dir) => dir,
        None => resolve_data_dir(|k| env::var(k).ok())
            .context("no data directory: set DARKSIDE_DATA_DIR or HOME")?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create data dir {}", dir.display()))?;
    let mut store = SessionStore::new(FileStore::new(&dir));

    match cli.command {
        Commands::Run {
            week,
            defender,
            seed,
            random,
            frame_ms,
            max_steps,
            initials,
            jersey,
            json,
        } => {
            let config = GameConfig::from_env();
            let week = week.unwrap_or(store.campaign().current_week);
            let mode = match random {
                Some(tap_chance) if !(0.0..=1.0).contains(&tap_chance) => {
                    bail!("--random must be between 0 and 1, got {tap_chance}")
                }
                Some(tap_chance) => AutopilotMode::Random { tap_chance },
                None => AutopilotMode::Ideal,
            };
            let high_score = store.high_score();
            cmd_run(
                &mut store,
                config,
                SessionSetup {
                    week,
                    archetype: defender,
                    seed,
                    high_score,
                },
                Autopilot::new(mode, frame_ms, seed),
                max_steps,
                initials.as_deref().map(|i| (i, jersey)),
                json,
            )
        }
        Commands::Leaderboard => {
            for (rank, e) in store.leaderboard().entries().iter().enumerate() {
                println!(
                    "{:>2}. {:<3} #{:<2} {:>6}  wave {:>2}  {} tackles  {}",
                    rank + 1,
                    e.initials,
                    e.jersey_number,
                    e.score,
                    e.wave,
                    e.tackles,
                    e.timestamp.format("%Y-%m-%d")
                );
            }
            Ok(())
        }
        Commands::Reset => {
            store.reset();
            println!("cleared session data in {}", dir.display());
            Ok(())
        }
    }
}

fn cmd_run(
    store: &mut SessionStore<FileStore>,
    config: GameConfig,
    setup: SessionSetup,
    mut bot: Autopilot,
    max_steps: usize,
    submit: Option<(&str, u32)>,
    json: bool,
) -> Result<()> {
    store.start_game_session(setup.week);
    let mut runner = HeadlessRunner::with_history_limit(DefenseLogic::new(config, setup), 64);
    let steps = runner.run_until(
        max_steps,
        |s| bot.next_input(s),
        |s| s.controller.is_over(),
    );

    let controller = &runner.state().controller;
    let stats = *controller.stats();
    store.record_stats(stats);
    if !controller.is_over() {
        log::warn!("stopped after {steps} steps without finishing the session");
    }
    let victory = controller.victory() == Some(true);
    let summary = store.end_game_session(stats);
    if victory && store.complete_stage_defense(setup.week, summary.final_score) {
        log::info!("campaign advanced to week {}", store.campaign().current_week);
    }

    let mut rank = None;
    if let Some((initials, jersey)) = submit {
        if summary.qualifies_for_leaderboard {
            let entry = LeaderboardEntry::new(
                initials,
                jersey,
                summary.final_score,
                summary.wave,
                summary.tackles,
                Utc::now(),
            )?;
            rank = store.add_leaderboard_entry(entry);
        } else {
            log::info!("score {} does not make the leaderboard", summary.final_score);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "week {} {}: {} points (raw {}), wave {}, {} plays, {} tackles, {} sacks, {} INTs{}",
            summary.week,
            if victory { "won" } else { "lost" },
            summary.final_score,
            summary.raw_score,
            summary.wave,
            summary.plays,
            summary.tackles,
            summary.sacks,
            summary.interceptions,
            if summary.new_high_score { "  NEW HIGH SCORE" } else { "" }
        );
        if let Some(rank) = rank {
            println!("leaderboard rank {}", rank + 1);
        }
    }
    Ok(())
}
