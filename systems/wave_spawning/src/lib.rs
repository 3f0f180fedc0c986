#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave spawning system responsible for emitting wave commands on a timer.

use std::time::Duration;

use glam::Vec3;
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ruin_survival_core::{Command, Event, WaveConfig};

/// Repeating timer owned by the spawner. Dropping it cancels it.
#[derive(Debug)]
struct RepeatingTimer {
    interval: Duration,
    accumulator: Duration,
}

impl RepeatingTimer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    /// Advances the timer, returning how many intervals elapsed.
    fn advance(&mut self, dt: Duration) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut fired = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            fired += 1;
        }
        fired
    }
}

/// Pure system that starts a new wave on every timer interval.
///
/// A session start or reset cancels any running timer before arming a new
/// one, so at most one timer ever exists. Wave `n` requests `n` enemies.
#[derive(Debug)]
pub struct WaveSpawning {
    config: WaveConfig,
    timer: Option<RepeatingTimer>,
    rng: ChaCha8Rng,
    wave: u32,
}

impl WaveSpawning {
    /// Creates a new spawner using the supplied configuration.
    #[must_use]
    pub fn new(config: WaveConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            timer: None,
            wave: 0,
        }
    }

    /// Reports whether the repeating timer is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Consumes world events to emit wave commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SessionStarted | Event::SessionReset => self.restart(out),
                Event::FrameAdvanced { dt } => self.advance(*dt, out),
                _ => {}
            }
        }
    }

    fn restart(&mut self, out: &mut Vec<Command>) {
        self.wave = 0;
        self.timer = Some(RepeatingTimer::new(self.config.spawn_interval()));
        self.begin_next_wave(out);
    }

    fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let Some(timer) = self.timer.as_mut() else {
            return;
        };
        let fired = timer.advance(dt);
        for _ in 0..fired {
            if self.timer.is_none() {
                break;
            }
            self.begin_next_wave(out);
        }
    }

    fn begin_next_wave(&mut self, out: &mut Vec<Command>) {
        if self.wave >= self.config.max_waves {
            self.cancel(out);
            return;
        }

        self.wave += 1;
        let positions = (0..self.wave).map(|_| self.spawn_position()).collect();
        out.push(Command::BeginWave {
            wave: self.wave,
            positions,
        });

        if self.wave >= self.config.max_waves {
            self.cancel(out);
        }
    }

    fn cancel(&mut self, out: &mut Vec<Command>) {
        if self.timer.take().is_some() {
            info!("wave timer cancelled after wave {}", self.wave);
            out.push(Command::FinishWaves);
        }
    }

    fn spawn_position(&mut self) -> Vec3 {
        let extent = self.config.spawn_half_extent;
        if !(extent.is_finite() && extent > 0.0) {
            return Vec3::ZERO;
        }
        Vec3::new(
            self.rng.gen_range(-extent..extent),
            0.0,
            self.rng.gen_range(-extent..extent),
        )
    }
}
