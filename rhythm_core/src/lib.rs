//! # rhythm_core
//!
//! The beat-driven particle/trigger engine behind the Beat Ring visualizer.
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`track`] | 8-step rhythm patterns and per-instrument configuration |
//! | [`clock`] | fixed-tempo step scheduler, driven by polled timestamps |
//! | [`particle`] | spawn, kinematics and the off-screen removal predicate |
//! | [`ring`] | ring-band geometry and the one-shot trigger detector |
//! | [`error`] | construction-time configuration errors |
//!
//! Everything here is pure state + arithmetic: no clock reads, no I/O, no
//! windowing.  The frame loop samples wall time once per iteration and hands
//! it to [`Scheduler::tick`]; randomness enters only through the injectable
//! RNG of [`Particle::spawn`].
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use rand::{rngs::SmallRng, SeedableRng};
//! use rhythm_core::{Particle, Pattern, Rgb, RingTarget, Scheduler,
//!                   SoundId, TrackConfig, TrackId};
//!
//! let kick = TrackConfig::new(
//!     TrackId(0),
//!     Pattern::from_steps(&[1, 0, 0, 0, 1, 1, 0, 0]).unwrap(),
//!     Rgb::new(193, 124, 90),
//!     3.0,
//!     SoundId(0),
//! ).unwrap();
//!
//! let mut scheduler = Scheduler::new(60.0, vec![kick]).unwrap();
//! let ring = RingTarget::new((400.0, 300.0), 200.0, 50.0).unwrap();
//! let mut rng = SmallRng::seed_from_u64(7);
//!
//! // The first beat fires one interval in and plays pattern step 0.
//! let events = scheduler.tick(Duration::from_secs(1));
//! let mut particle = Particle::spawn(&events[0].config, (400.0, 300.0), &mut rng);
//!
//! // Fly outward; crossing the ring band fires the trigger exactly once.
//! let mut fired = 0;
//! for _ in 0..200 {
//!     particle.step();
//!     if ring.check(&mut particle) {
//!         fired += 1;
//!     }
//! }
//! assert_eq!(fired, 1);
//! ```

pub mod clock;
pub mod error;
pub mod particle;
pub mod ring;
pub mod track;

pub use clock::{Scheduler, SpawnEvent};
pub use error::ConfigError;
pub use particle::Particle;
pub use ring::RingTarget;
pub use track::{Pattern, Rgb, SoundId, TrackConfig, TrackId, PATTERN_STEPS};
