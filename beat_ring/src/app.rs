//! Frame orchestration.
//!
//! `AppState` owns the scheduler, the ring target, the per-track particle
//! collections and the audio handle; [`run`] drives the strict per-frame
//! cycle: beats → kinematics → triggers, acquire, compose, cull, present.

use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::SeedableRng;

use rhythm_core::{
    ConfigError, Particle, Pattern, Rgb, RingTarget, Scheduler, SoundId, TrackConfig, TrackId,
};

use crate::audio::{AudioOut, Sampler};
use crate::camera::{FrameSource, SyntheticFeed};
use crate::landmark::{spawn_landmark_source, LandmarkFrame, SimLandmarkSource};
use crate::stage::{Stage, WIN_H, WIN_W};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// One instrument as configured at startup, before its clip is loaded.
#[derive(Clone, Debug)]
pub struct TrackSpec {
    pub name:  String,
    pub steps: [u8; 8],
    pub color: Rgb,
    /// Clip file name, resolved against the sound directory.
    pub file:  String,
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub tempo_bpm:   f64,
    /// Per-axis particle speed in pixels per frame.
    pub speed:       f32,
    pub ring_radius: f32,
    pub ring_band:   f32,
    pub sound_dir:   PathBuf,
    pub tracks:      Vec<TrackSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let track = |name: &str, steps: [u8; 8], color: Rgb, file: &str| TrackSpec {
            name: name.to_string(),
            steps,
            color,
            file: file.to_string(),
        };
        AppConfig {
            tempo_bpm:   60.0,
            speed:       3.0,
            ring_radius: 200.0,
            ring_band:   50.0,
            sound_dir:   PathBuf::from("sounds"),
            tracks: vec![
                track("hihat", [1, 1, 1, 1, 1, 1, 1, 1], Rgb::new(90, 185, 193), "hihat.wav"),
                track("snare", [0, 0, 1, 0, 0, 0, 1, 0], Rgb::new(90, 193, 98), "snare.wav"),
                track("kick",  [1, 0, 0, 0, 1, 1, 0, 0], Rgb::new(193, 124, 90), "kick.wav"),
            ],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    scheduler: Scheduler,
    ring:      RingTarget,
    /// Live particles per track, indexed by `TrackId`.
    particles: Vec<Vec<Particle>>,
    /// Track display names, same indexing, for the status line.
    names:     Vec<String>,
    audio:     Box<dyn AudioOut>,
    rng:       SmallRng,
    pub status: String,
}

impl AppState {
    /// Pair the track specs with their loaded sound handles and validate
    /// everything; nothing invalid survives past this point.
    pub fn new(
        cfg: &AppConfig,
        sounds: Vec<SoundId>,
        audio: Box<dyn AudioOut>,
    ) -> Result<Self, ConfigError> {
        let mut tracks = Vec::with_capacity(cfg.tracks.len());
        for (i, (spec, sound)) in cfg.tracks.iter().zip(sounds).enumerate() {
            tracks.push(TrackConfig::new(
                TrackId(i),
                Pattern::from_steps(&spec.steps)?,
                spec.color,
                cfg.speed,
                sound,
            )?);
        }

        let scheduler = Scheduler::new(cfg.tempo_bpm, tracks)?;
        let center = (WIN_W as f32 / 2.0, WIN_H as f32 / 2.0);
        let ring = RingTarget::new(center, cfg.ring_radius, cfg.ring_band)?;

        Ok(AppState {
            scheduler,
            ring,
            particles: vec![Vec::new(); cfg.tracks.len()],
            names: cfg.tracks.iter().map(|t| t.name.clone()).collect(),
            audio,
            rng: SmallRng::from_entropy(),
            status: format!("{:.0} bpm", cfg.tempo_bpm),
        })
    }

    /// Steps 1–2 of the frame cycle: spawn on a due beat, then move every
    /// particle and trigger-check it, dispatching audio on first entry into
    /// the ring band.
    ///
    /// Spawns land before kinematics, so a fresh particle takes its first
    /// step this frame but starts from the ring center and cannot reach the
    /// band yet.
    pub fn advance(&mut self, now: Duration) {
        let center = (self.ring.cx, self.ring.cy);
        for event in self.scheduler.tick(now) {
            let particle = Particle::spawn(&event.config, center, &mut self.rng);
            self.particles[event.track.0].push(particle);
        }

        for (i, track) in self.particles.iter_mut().enumerate() {
            for particle in track.iter_mut() {
                particle.step();
                if self.ring.check(particle) {
                    self.audio.play(particle.sound);
                    self.status =
                        format!("play {}  step {}", self.names[i], self.scheduler.step_counter());
                }
            }
        }
    }

    /// Step 5: retire particles that left the visible rectangle.  Runs after
    /// trigger checks, so a particle can both fire and disappear in the same
    /// frame.
    pub fn cull(&mut self, width: f32, height: f32) {
        for track in &mut self.particles {
            track.retain(|p| p.in_bounds(width, height));
        }
    }

    pub fn tracks(&self) -> &[Vec<Particle>] {
        &self.particles
    }

    pub fn ring(&self) -> &RingTarget {
        &self.ring
    }

    pub fn live_count(&self) -> usize {
        self.particles.iter().map(Vec::len).sum()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Audio assets load first so a missing clip fails before any window opens;
/// then the simulated performer, the stage and the synthetic feed come up
/// and the loop runs until quit or end-of-stream.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let paths: Vec<PathBuf> = cfg.tracks.iter().map(|t| cfg.sound_dir.join(&t.file)).collect();
    let (sampler, sounds) = Sampler::start(&paths)?;

    let (sim_tx, sim_rx) = mpsc::channel();
    let landmark_rx = spawn_landmark_source(SimLandmarkSource { rx: sim_rx });

    let mut stage = Stage::new(sim_tx)?;
    let mut feed = SyntheticFeed::new(WIN_W, WIN_H);
    let mut app = AppState::new(&cfg, sounds, Box::new(sampler))?;

    let mut landmarks = LandmarkFrame::default();
    let started = Instant::now();

    while stage.is_open() {
        // Quit keys are sampled up front; a pressed key skips the frame.
        if !stage.poll_input() {
            break;
        }

        // 1–2. Beats, kinematics, triggers.
        app.advance(started.elapsed());

        // 3. Next video frame plus the newest landmark detection.
        let Some(backdrop) = feed.next_frame() else { break };
        loop {
            match landmark_rx.try_recv() {
                Ok(frame) => landmarks = frame,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        // 4. Compose: backdrop, markers, particles, ring.
        stage.compose(backdrop, &landmarks, app.tracks(), app.ring(), &app.status);

        // 5. Cull after trigger checks, before the next frame's spawns.
        // The visible rectangle is the frame's, not the window's.
        app.cull(feed.width() as f32, feed.height() as f32);

        // 6. Present.
        stage.present();
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
