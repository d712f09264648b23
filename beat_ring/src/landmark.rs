//! Body-landmark acquisition — the pose-estimation seam.
//!
//! The ML model that turns camera frames into joint coordinates is an
//! external collaborator; this module fixes the data it must deliver and
//! ships a simulation backend so the stage works without one.  Consumers
//! receive [`LandmarkFrame`]s over an `mpsc` channel and never know which
//! backend produced them.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

// ════════════════════════════════════════════════════════════════════════════
// Landmark data
// ════════════════════════════════════════════════════════════════════════════

/// A single joint position, normalized to `[0, 1]²` of the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// Pose-model indices of the left-foot joints (ankle, heel, toe).
pub const LEFT_FOOT: [usize; 3] = [27, 29, 31];
/// Pose-model indices of the right-foot joints.
pub const RIGHT_FOOT: [usize; 3] = [28, 30, 32];

/// One detection result.
///
/// Any set may be absent for a frame — the person stepped out, a hand left
/// the view.  Absence means "skip that marker this frame", never an error.
#[derive(Clone, Debug, Default)]
pub struct LandmarkFrame {
    pub left_hand:  Option<Vec<Landmark>>,
    pub right_hand: Option<Vec<Landmark>>,
    pub pose:       Option<Vec<Landmark>>,
}

impl LandmarkFrame {
    /// Centroid of the left-hand point set, if detected.
    pub fn left_hand_center(&self) -> Option<(f32, f32)> {
        self.left_hand.as_deref().and_then(centroid)
    }

    /// Centroid of the right-hand point set, if detected.
    pub fn right_hand_center(&self) -> Option<(f32, f32)> {
        self.right_hand.as_deref().and_then(centroid)
    }

    /// Centroid of the left-foot joints, if the pose covers them.
    pub fn left_foot_center(&self) -> Option<(f32, f32)> {
        self.pose.as_deref().and_then(|p| joint_centroid(p, &LEFT_FOOT))
    }

    /// Centroid of the right-foot joints, if the pose covers them.
    pub fn right_foot_center(&self) -> Option<(f32, f32)> {
        self.pose.as_deref().and_then(|p| joint_centroid(p, &RIGHT_FOOT))
    }
}

/// Mean position of a point set; `None` when empty.
pub fn centroid(points: &[Landmark]) -> Option<(f32, f32)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some((sx / n, sy / n))
}

/// Centroid of selected joints; `None` if any index falls outside the pose.
fn joint_centroid(pose: &[Landmark], indices: &[usize]) -> Option<(f32, f32)> {
    let mut sx = 0.0;
    let mut sy = 0.0;
    for &i in indices {
        let joint = pose.get(i)?;
        sx += joint.x;
        sy += joint.y;
    }
    let n = indices.len() as f32;
    Some((sx / n, sy / n))
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait — unified interface for model backends and simulation
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`LandmarkFrame`]s over a channel.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<LandmarkFrame>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<LandmarkFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — simulated performer (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Window-state sample forwarded by the stage once per frame.
#[derive(Clone, Copy, Debug)]
pub struct SimPose {
    /// Cursor position normalized to the window, if the cursor is inside it.
    pub cursor: Option<(f32, f32)>,
}

/// Simulated performer.
///
/// The cursor drives the right hand; the left hand mirrors it across the
/// vertical center line, and the feet sway near the bottom edge on a phase
/// accumulator.  With the cursor outside the window no hands are reported,
/// which exercises the "no marker this frame" path end to end.
pub struct SimLandmarkSource {
    pub rx: Receiver<SimPose>,
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<LandmarkFrame>) {
        let mut phase = 0.0f32;
        for pose in self.rx {
            phase += 1.0 / 60.0;
            if tx.send(synth_frame(pose.cursor, phase)).is_err() {
                return;
            }
        }
    }
}

/// Build one simulated detection result.
fn synth_frame(cursor: Option<(f32, f32)>, phase: f32) -> LandmarkFrame {
    // Five fingertip points fanned around a palm position.
    let hand = |px: f32, py: f32| -> Vec<Landmark> {
        const SPREAD: f32 = 0.035;
        (0..5)
            .map(|i| {
                let a = i as f32 / 5.0 * std::f32::consts::TAU;
                Landmark { x: px + a.cos() * SPREAD, y: py + a.sin() * SPREAD }
            })
            .collect()
    };

    let (left_hand, right_hand) = match cursor {
        Some((cx, cy)) => (Some(hand(1.0 - cx, cy)), Some(hand(cx, cy))),
        None => (None, None),
    };

    // 33-point pose; only the foot joints carry meaningful positions here.
    let mut pose = vec![Landmark { x: 0.5, y: 0.5 }; 33];
    let sway = (phase * 1.3).sin() * 0.04;
    for (&i, off) in LEFT_FOOT.iter().zip([0.0, -0.012, 0.015]) {
        pose[i] = Landmark { x: 0.38 + sway + off, y: 0.92 };
    }
    for (&i, off) in RIGHT_FOOT.iter().zip([0.0, -0.012, 0.015]) {
        pose[i] = Landmark { x: 0.62 - sway + off, y: 0.92 };
    }

    LandmarkFrame { left_hand, right_hand, pose: Some(pose) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_is_the_mean_position() {
        let pts = vec![
            Landmark { x: 0.0, y: 0.0 },
            Landmark { x: 1.0, y: 0.0 },
            Landmark { x: 0.5, y: 0.9 },
        ];
        let (cx, cy) = centroid(&pts).unwrap();
        assert!((cx - 0.5).abs() < 1e-6);
        assert!((cy - 0.3).abs() < 1e-6);
    }

    #[test]
    fn centroid_of_nothing_is_none() {
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn foot_centers_use_the_foot_joints() {
        let mut pose = vec![Landmark { x: 0.0, y: 0.0 }; 33];
        for &i in &LEFT_FOOT {
            pose[i] = Landmark { x: 0.3, y: 0.9 };
        }
        for &i in &RIGHT_FOOT {
            pose[i] = Landmark { x: 0.7, y: 0.9 };
        }
        let frame = LandmarkFrame { pose: Some(pose), ..Default::default() };
        assert_eq!(frame.left_foot_center(), Some((0.3, 0.9)));
        assert_eq!(frame.right_foot_center(), Some((0.7, 0.9)));
    }

    #[test]
    fn truncated_pose_yields_no_foot_marker() {
        // 20 joints — the foot indices are missing entirely.
        let frame = LandmarkFrame {
            pose: Some(vec![Landmark { x: 0.5, y: 0.5 }; 20]),
            ..Default::default()
        };
        assert_eq!(frame.left_foot_center(), None);
        assert_eq!(frame.right_foot_center(), None);
    }

    #[test]
    fn absent_sets_are_not_an_error() {
        let frame = LandmarkFrame::default();
        assert_eq!(frame.left_hand_center(), None);
        assert_eq!(frame.right_hand_center(), None);
        assert_eq!(frame.left_foot_center(), None);
    }

    #[test]
    fn sim_hands_follow_the_cursor() {
        let frame = synth_frame(Some((0.25, 0.4)), 0.0);
        let (rx, ry) = frame.right_hand_center().unwrap();
        assert!((rx - 0.25).abs() < 1e-3);
        assert!((ry - 0.4).abs() < 1e-3);
        // Left hand mirrors across the vertical center line.
        let (lx, _) = frame.left_hand_center().unwrap();
        assert!((lx - 0.75).abs() < 1e-3);
    }

    #[test]
    fn sim_hands_vanish_without_a_cursor() {
        let frame = synth_frame(None, 1.0);
        assert!(frame.left_hand.is_none());
        assert!(frame.right_hand.is_none());
        // The performer's feet stay on screen.
        assert!(frame.left_foot_center().is_some());
    }

    #[test]
    fn sim_source_forwards_over_the_channel() {
        let (pose_tx, pose_rx) = mpsc::channel();
        let frames = spawn_landmark_source(SimLandmarkSource { rx: pose_rx });
        pose_tx.send(SimPose { cursor: Some((0.5, 0.5)) }).unwrap();
        let frame = frames.recv().unwrap();
        assert!(frame.right_hand.is_some());
    }
}
