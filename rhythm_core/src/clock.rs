//! Fixed-tempo beat scheduler.
//!
//! The scheduler never reads a clock of its own: the frame loop samples wall
//! time once per iteration and passes it to [`Scheduler::tick`], which makes
//! the whole thing drivable with synthetic timestamps in tests.

use std::time::Duration;

use crate::error::ConfigError;
use crate::track::{TrackConfig, TrackId};

// ════════════════════════════════════════════════════════════════════════════
// SpawnEvent
// ════════════════════════════════════════════════════════════════════════════

/// One particle to spawn: emitted for each track whose pattern bit is set at
/// the step that just fired.
#[derive(Clone, Copy, Debug)]
pub struct SpawnEvent {
    pub track:  TrackId,
    pub config: TrackConfig,
}

// ════════════════════════════════════════════════════════════════════════════
// Scheduler
// ════════════════════════════════════════════════════════════════════════════

/// Wall-clock-driven step sequencer over a fixed track list.
#[derive(Debug)]
pub struct Scheduler {
    tracks:    Vec<TrackConfig>,
    interval:  Duration,
    last_step: Duration,
    counter:   u64,
}

impl Scheduler {
    /// `tempo_bpm` must be positive; one step fires every `60 / tempo_bpm`
    /// seconds.
    pub fn new(tempo_bpm: f64, tracks: Vec<TrackConfig>) -> Result<Self, ConfigError> {
        if !(tempo_bpm > 0.0) {
            return Err(ConfigError::TempoOutOfRange { bpm: tempo_bpm });
        }
        Ok(Scheduler {
            tracks,
            interval:  Duration::from_secs_f64(60.0 / tempo_bpm),
            last_step: Duration::ZERO,
            counter:   0,
        })
    }

    /// Advance the clock to `now` (time since the loop started) and return
    /// the spawn events for the step that fired, if any.
    ///
    /// At most one step fires per call.  The reference timestamp resets to
    /// `now`, not `now - overshoot`: a frame arriving more than one interval
    /// late drops the missed beats instead of queueing them.
    pub fn tick(&mut self, now: Duration) -> Vec<SpawnEvent> {
        if now.saturating_sub(self.last_step) < self.interval {
            return Vec::new();
        }

        let step = self.counter;
        self.counter += 1;
        self.last_step = now;

        self.tracks
            .iter()
            .filter(|t| t.pattern.hit(step))
            .map(|t| SpawnEvent { track: t.id, config: *t })
            .collect()
    }

    /// Steps fired since construction.
    pub fn step_counter(&self) -> u64 {
        self.counter
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn tracks(&self) -> &[TrackConfig] {
        &self.tracks
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Pattern, Rgb, SoundId};

    fn track(id: usize, steps: &[u8]) -> TrackConfig {
        TrackConfig::new(
            TrackId(id),
            Pattern::from_steps(steps).unwrap(),
            Rgb::new(10, 20, 30),
            3.0,
            SoundId(id),
        )
        .unwrap()
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn rejects_nonpositive_tempo() {
        assert_eq!(
            Scheduler::new(0.0, vec![]).unwrap_err(),
            ConfigError::TempoOutOfRange { bpm: 0.0 }
        );
        assert!(Scheduler::new(-60.0, vec![]).is_err());
    }

    #[test]
    fn no_fire_before_first_interval() {
        let mut s = Scheduler::new(60.0, vec![track(0, &[1; 8])]).unwrap();
        assert!(s.tick(ms(0)).is_empty());
        assert!(s.tick(ms(999)).is_empty());
        assert_eq!(s.step_counter(), 0);
    }

    #[test]
    fn first_fire_plays_step_zero() {
        // Kick pattern has a hit at step 0; snare does not.
        let mut s =
            Scheduler::new(60.0, vec![track(0, &[0, 0, 1, 0, 0, 0, 1, 0]), track(1, &[1, 0, 0, 0, 1, 1, 0, 0])])
                .unwrap();
        let events = s.tick(ms(1000));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].track, TrackId(1));
        assert_eq!(s.step_counter(), 1);
    }

    #[test]
    fn counter_advances_once_per_fire() {
        let mut s = Scheduler::new(120.0, vec![track(0, &[1; 8])]).unwrap();
        let mut fires = 0;
        for t in (0..5000).step_by(10) {
            if !s.tick(ms(t)).is_empty() {
                fires += 1;
            }
        }
        // 120 BPM = one step each 500 ms; 5 s of polling at 10 ms → 9 fires
        // (the first lands at t = 500).
        assert_eq!(fires, 9);
        assert_eq!(s.step_counter(), 9);
    }

    #[test]
    fn at_most_one_step_per_interval_of_time() {
        let mut s = Scheduler::new(60.0, vec![track(0, &[1; 8])]).unwrap();
        assert_eq!(s.tick(ms(1000)).len(), 1);
        // Polling again immediately, and anywhere short of a full interval
        // later, stays silent.
        assert!(s.tick(ms(1001)).is_empty());
        assert!(s.tick(ms(1999)).is_empty());
        assert_eq!(s.tick(ms(2000)).len(), 1);
    }

    #[test]
    fn late_frame_drops_beats_instead_of_queueing() {
        let mut s = Scheduler::new(60.0, vec![track(0, &[1; 8])]).unwrap();
        // A frame stalls for 3.5 intervals: exactly one step fires, and the
        // next one is measured from the late timestamp.
        assert_eq!(s.tick(ms(3500)).len(), 1);
        assert_eq!(s.step_counter(), 1);
        assert!(s.tick(ms(3600)).is_empty());
        assert!(s.tick(ms(4499)).is_empty());
        assert_eq!(s.tick(ms(4500)).len(), 1);
    }

    #[test]
    fn three_tracks_same_step_emit_three_events() {
        let mut s = Scheduler::new(60.0, vec![
            track(0, &[1; 8]),
            track(1, &[1, 0, 0, 0, 0, 0, 0, 0]),
            track(2, &[1, 0, 0, 0, 1, 1, 0, 0]),
        ])
        .unwrap();
        let events = s.tick(ms(1000));
        assert_eq!(events.len(), 3);
        let ids: Vec<_> = events.iter().map(|e| e.track).collect();
        assert_eq!(ids, vec![TrackId(0), TrackId(1), TrackId(2)]);
    }

    #[test]
    fn pattern_wraps_after_eight_steps() {
        // A track hitting only step 0 fires again on step 8.
        let mut s = Scheduler::new(60.0, vec![track(0, &[1, 0, 0, 0, 0, 0, 0, 0])]).unwrap();
        let mut spawns = Vec::new();
        for beat in 1..=9 {
            let events = s.tick(Duration::from_secs(beat));
            spawns.push(events.len());
        }
        assert_eq!(spawns, vec![1, 0, 0, 0, 0, 0, 0, 0, 1]);
    }
}
