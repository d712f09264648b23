//! Ring-target geometry and the one-shot trigger detector.

use crate::error::ConfigError;
use crate::particle::Particle;

// ════════════════════════════════════════════════════════════════════════════
// RingTarget
// ════════════════════════════════════════════════════════════════════════════

/// The annular trigger zone around the screen center.
///
/// A point is "in the band" when its distance from the center lies in
/// `[radius, radius + band)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingTarget {
    pub cx:     f32,
    pub cy:     f32,
    pub radius: f32,
    pub band:   f32,
}

impl RingTarget {
    pub fn new(center: (f32, f32), radius: f32, band: f32) -> Result<Self, ConfigError> {
        if !(radius > 0.0) || !(band > 0.0) {
            return Err(ConfigError::DegenerateRing);
        }
        Ok(RingTarget { cx: center.0, cy: center.1, radius, band })
    }

    /// Euclidean distance of a point from the ring center.
    pub fn distance(&self, x: f32, y: f32) -> f32 {
        let dx = x - self.cx;
        let dy = y - self.cy;
        (dx * dx + dy * dy).sqrt()
    }

    /// Band membership test for a raw point.
    pub fn band_contains(&self, x: f32, y: f32) -> bool {
        let d = self.distance(x, y);
        d >= self.radius && d < self.radius + self.band
    }

    /// One-shot trigger check.
    ///
    /// Returns true exactly when the particle sits in the band and has not
    /// fired before.  The particle's `triggered` latch flips on that call;
    /// every later call for the same particle returns false no matter how
    /// many frames it spends inside the band.
    pub fn check(&self, particle: &mut Particle) -> bool {
        if particle.triggered {
            return false;
        }
        if self.band_contains(particle.x, particle.y) {
            particle.triggered = true;
            true
        } else {
            false
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
