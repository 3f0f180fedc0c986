#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the ruin survival simulation headless.

mod headless;

use std::{fmt, fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use ruin_survival_core::{SimulationConfig, ThrowKind};
use ruin_survival_runtime::Simulation;
use ruin_survival_world::query;

/// Command-line arguments accepted by the headless runner.
#[derive(Debug, Parser)]
#[command(name = "ruin-survival", about = "Runs the ruin survival simulation without a window")]
struct CliArgs {
    /// TOML file overriding the default tuning parameters.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 1_800)]
    frames: u32,
    /// Wall-clock duration of each frame in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 16)]
    frame_ms: u64,
    /// Overrides the wave spawn seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Throws a projectile every N frames; zero disables throwing.
    #[arg(long, value_name = "N", default_value_t = 20)]
    throw_every: u32,
    /// Simulates a failed level load to exercise the fallback ground.
    #[arg(long)]
    missing_level: bool,
    /// Requests an immersive session before the run starts.
    #[arg(long)]
    immersive: bool,
}

/// Outcome of a headless run.
#[derive(Debug)]
struct Summary {
    frames_rendered: u64,
    simulated: Duration,
    wave: u32,
    max_waves: u32,
    kills: u32,
    health_percent: f32,
    alive_enemies: usize,
    player_dead: bool,
    deaths_shown: u32,
    notices: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "frames rendered: {} ({:.1}s simulated)",
            self.frames_rendered,
            self.simulated.as_secs_f32()
        )?;
        writeln!(f, "wave: {}/{}", self.wave, self.max_waves)?;
        writeln!(f, "kills: {}", self.kills)?;
        writeln!(f, "enemies alive: {}", self.alive_enemies)?;
        writeln!(
            f,
            "health: {:.0}%{}",
            self.health_percent,
            if self.player_dead { " (dead)" } else { "" }
        )?;
        write!(
            f,
            "death screens: {}, notices: {}",
            self.deaths_shown, self.notices
        )
    }
}

/// Entry point for the ruin survival command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    let summary = run(&args, config);
    println!("{summary}");
    Ok(())
}

fn load_config(args: &CliArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SimulationConfig::from_toml_str(&contents)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.waves.rng_seed = seed;
    }
    Ok(config)
}

fn run(args: &CliArgs, config: SimulationConfig) -> Summary {
    let max_waves = config.waves.max_waves;
    let (collaborators, ledger) = headless::collaborators(args.missing_level);
    let mut simulation = Simulation::new(config, collaborators);

    if args.immersive && !simulation.enter_immersive() {
        info!("continuing in flat mode");
    }
    simulation.start();

    let frame = Duration::from_millis(args.frame_ms);
    let mut simulated = Duration::ZERO;
    for index in 1..=args.frames {
        simulated += simulation.frame(frame).simulated;
        if args.throw_every > 0 && index % args.throw_every == 0 {
            simulation.throw(ThrowKind::Hand);
        }
    }

    let world = simulation.world();
    let player = query::player(world);
    let ledger = ledger.borrow();
    Summary {
        frames_rendered: ledger.frames_rendered,
        simulated,
        wave: query::wave(world).current,
        max_waves,
        kills: query::kill_count(world),
        health_percent: player.health_percent(),
        alive_enemies: query::enemy_view(world)
            .iter()
            .filter(|enemy| enemy.is_alive())
            .count(),
        player_dead: player.dead,
        deaths_shown: ledger.deaths_shown,
        notices: ledger.notices.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["ruin-survival"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn defaults_parse() {
        let args = args(&[]);
        assert_eq!(args.frames, 1_800);
        assert_eq!(args.frame_ms, 16);
        assert!(args.config.is_none());
    }

    #[test]
    fn seed_overrides_config() {
        let config = load_config(&args(&["--seed", "42"])).expect("config");
        assert_eq!(config.waves.rng_seed, 42);
    }

    #[test]
    fn short_run_reaches_the_first_wave() {
        let args = args(&["--frames", "10", "--immersive", "--missing-level"]);
        let summary = run(&args, SimulationConfig::default());

        assert_eq!(summary.frames_rendered, 10);
        assert_eq!(summary.wave, 1);
        assert_eq!(summary.notices, 1);
        assert!(!summary.player_dead);
    }
}
