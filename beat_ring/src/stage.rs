//! Software-rendered stage using `minifb`.
//!
//! Compose order each frame: video backdrop, landmark markers, live
//! particles, then the alpha-blended target ring, with the status line and
//! key legend on top.  Composition ([`Stage::compose`]) and presentation
//! ([`Stage::present`]) are separate calls so the orchestrator can cull
//! between them.

use std::sync::mpsc::Sender;

use minifb::{Key, MouseMode, Window, WindowOptions};

use rhythm_core::{Particle, RingTarget};

use crate::landmark::{LandmarkFrame, SimPose};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 800;
pub const WIN_H: usize = 600;

const MARKER_RADIUS:    f32 = 30.0;
const MARKER_THICKNESS: f32 = 10.0;
const PARTICLE_RADIUS:  f32 = 20.0;

const RING_SEGMENTS: usize = 16;
const RING_ALPHA:    f32   = 0.5;
const SEGMENT_EVEN:  u32   = 0xFFFFFFFF; // white
const SEGMENT_ODD:   u32   = 0xFF0000C8; // deep blue

const LEFT_HAND_COLOR:  u32 = 0xFF00C800;
const RIGHT_HAND_COLOR: u32 = 0xFF0000FF;
const LEFT_FOOT_COLOR:  u32 = 0xFFFF0000;
const RIGHT_FOOT_COLOR: u32 = 0xFFFFFF00;

const STATUS_H:  usize = 36;
const STATUS_BG: u32   = 0xFF14293A;

// ════════════════════════════════════════════════════════════════════════════
// Stage
// ════════════════════════════════════════════════════════════════════════════

pub struct Stage {
    window: Window,
    canvas: Canvas,
    sim_tx: Sender<SimPose>,
}

impl Stage {
    pub fn new(sim_tx: Sender<SimPose>) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "Beat Ring — rhythm visualizer",
            WIN_W,
            WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )
        .map_err(|e| anyhow::anyhow!("cannot open stage window: {e}"))?;

        // Camera-paced: ~30 fps, like the capture device it fronts.
        window.limit_update_rate(Some(std::time::Duration::from_millis(33)));

        Ok(Stage {
            window,
            canvas: Canvas::new(WIN_W, WIN_H),
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll the quit keys and forward the cursor to the simulated performer.
    /// Returns false when the app should exit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            return false;
        }
        if self.window.is_key_down(Key::Q) || self.window.is_key_down(Key::Escape) {
            return false;
        }

        let cursor = self
            .window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| (x / WIN_W as f32, y / WIN_H as f32));
        let _ = self.sim_tx.send(SimPose { cursor });
        true
    }

    /// Compose one frame into the back buffer.
    pub fn compose(
        &mut self,
        backdrop: &[u32],
        landmarks: &LandmarkFrame,
        tracks: &[Vec<Particle>],
        ring: &RingTarget,
        status: &str,
    ) {
        let c = &mut self.canvas;
        c.copy_from(backdrop);

        // ── Landmark markers ──────────────────────────────────────────────
        let to_px = |(nx, ny): (f32, f32)| (nx * WIN_W as f32, ny * WIN_H as f32);
        let markers = [
            (landmarks.left_hand_center(),  LEFT_HAND_COLOR),
            (landmarks.right_hand_center(), RIGHT_HAND_COLOR),
            (landmarks.left_foot_center(),  LEFT_FOOT_COLOR),
            (landmarks.right_foot_center(), RIGHT_FOOT_COLOR),
        ];
        for (center, color) in markers {
            if let Some(center) = center {
                let (px, py) = to_px(center);
                c.ring_marker(px, py, MARKER_RADIUS, MARKER_THICKNESS, color);
            }
        }

        // ── Particles ─────────────────────────────────────────────────────
        for track in tracks {
            for p in track {
                c.fill_circle(p.x, p.y, PARTICLE_RADIUS, p.color.argb());
            }
        }

        // ── Target ring ───────────────────────────────────────────────────
        c.ring_band(ring);

        // ── Status bar + key legend ───────────────────────────────────────
        c.fill_rect(0, WIN_H - STATUS_H, WIN_W, STATUS_H, STATUS_BG);
        c.label(status, 10, WIN_H - STATUS_H + 6, 0xFFEEEEEE);
        c.label("mouse = hands   q/esc = quit", 10, WIN_H - 14, 0xFF8899AA);
    }

    /// Flush the composed frame to the window.
    pub fn present(&mut self) {
        self.window
            .update_with_buffer(self.canvas.data(), WIN_W, WIN_H)
            .ok();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas — framebuffer painter (window-free, so the raster code is testable)
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    w:   usize,
    h:   usize,
    buf: Vec<u32>,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Canvas { w, h, buf: vec![0xFF00_0000; w * h] }
    }

    pub fn data(&self) -> &[u32] {
        &self.buf
    }

    /// Replace the whole buffer with a same-sized frame.
    pub fn copy_from(&mut self, frame: &[u32]) {
        if frame.len() == self.buf.len() {
            self.buf.copy_from_slice(frame);
        } else {
            self.buf.fill(0xFF00_0000);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.w && y < self.h {
            self.buf[y * self.w + x] = color;
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.buf[y * self.w + x]
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.h) {
            for col in x..(x + w).min(self.w) {
                self.buf[row * self.w + col] = color;
            }
        }
    }

    /// Filled circle, clipped to the buffer.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let (x0, x1, y0, y1) = clip_box(cx, cy, r, self.w, self.h);
        let r2 = r * r;
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.buf[y * self.w + x] = color;
                }
            }
        }
    }

    /// Stroked circle of the given line thickness — the landmark marker.
    pub fn ring_marker(&mut self, cx: f32, cy: f32, r: f32, thickness: f32, color: u32) {
        let outer = r + thickness / 2.0;
        let inner = (r - thickness / 2.0).max(0.0);
        let (x0, x1, y0, y1) = clip_box(cx, cy, outer, self.w, self.h);
        let (outer2, inner2) = (outer * outer, inner * inner);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let d2 = dx * dx + dy * dy;
                if d2 >= inner2 && d2 <= outer2 {
                    self.buf[y * self.w + x] = color;
                }
            }
        }
    }

    /// The target ring: 16 alternating arc segments filling exactly the
    /// trigger band `[radius, radius + band)`, blended at 50% over the
    /// scene.  Segment boundaries sit at odd multiples of π/16, so a
    /// boundary never lands on an axis.
    pub fn ring_band(&mut self, ring: &RingTarget) {
        use std::f32::consts::{PI, TAU};

        let outer = ring.radius + ring.band;
        let (x0, x1, y0, y1) = clip_box(ring.cx, ring.cy, outer, self.w, self.h);
        let (outer2, inner2) = (outer * outer, ring.radius * ring.radius);
        let seg_width = TAU / RING_SEGMENTS as f32;

        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 - ring.cx;
                let dy = y as f32 - ring.cy;
                let d2 = dx * dx + dy * dy;
                if d2 < inner2 || d2 >= outer2 {
                    continue;
                }
                let angle = (dy.atan2(dx) - PI / 16.0).rem_euclid(TAU);
                let seg = (angle / seg_width) as usize % RING_SEGMENTS;
                let color = if seg % 2 == 0 { SEGMENT_EVEN } else { SEGMENT_ODD };
                let under = self.buf[y * self.w + x];
                self.buf[y * self.w + x] = blend(under, color, RING_ALPHA);
            }
        }
    }

    /// Draw a text label in the built-in 3×5 font.
    pub fn label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let bits = glyph(ch);
            for row in 0..5 {
                for col in 0..3 {
                    if bits >> (14 - (row * 3 + col)) & 1 == 1 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > self.w {
                break;
            }
        }
    }
}

/// Integer bounding box of a circle, clipped to the buffer.
fn clip_box(cx: f32, cy: f32, r: f32, w: usize, h: usize) -> (usize, usize, usize, usize) {
    let x0 = (cx - r).floor().max(0.0) as usize;
    let y0 = (cy - r).floor().max(0.0) as usize;
    let x1 = ((cx + r).ceil() as usize + 1).min(w);
    let y1 = ((cy + r).ceil() as usize + 1).min(h);
    (x0, x1, y0, y1)
}

/// Blend `over` onto `under` at the given opacity, per channel.
fn blend(under: u32, over: u32, alpha: f32) -> u32 {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |shift: u32| {
        let u = (under >> shift & 0xFF) as f32;
        let o = (over >> shift & 0xFF) as f32;
        ((u + (o - u) * alpha) as u32) << shift
    };
    0xFF00_0000 | mix(16) | mix(8) | mix(0)
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font — 15 bits per glyph, rows top to bottom, MSB first
// ────────────────────────────────────────────────────────────────────────────

fn glyph(c: char) -> u16 {
    match c.to_ascii_lowercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_011_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_001_010_010,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'a' => 0b010_101_111_101_101,
        'b' => 0b110_101_110_101_110,
        'c' => 0b011_100_100_100_011,
        'd' => 0b110_101_101_101_110,
        'e' => 0b111_100_110_100_111,
        'f' => 0b111_100_110_100_100,
        'g' => 0b011_100_101_101_011,
        'h' => 0b101_101_111_101_101,
        'i' => 0b111_010_010_010_111,
        'j' => 0b001_001_001_101_010,
        'k' => 0b101_110_100_110_101,
        'l' => 0b100_100_100_100_111,
        'm' => 0b101_111_111_101_101,
        'n' => 0b110_101_101_101_101,
        'o' => 0b010_101_101_101_010,
        'p' => 0b110_101_110_100_100,
        'q' => 0b010_101_101_110_011,
        'r' => 0b110_101_110_110_101,
        's' => 0b011_100_010_001_110,
        't' => 0b111_010_010_010_010,
        'u' => 0b101_101_101_101_111,
        'v' => 0b101_101_101_101_010,
        'w' => 0b101_101_111_111_101,
        'x' => 0b101_010_010_010_101,
        'y' => 0b101_101_010_010_010,
        'z' => 0b111_001_010_100_111,
        ' ' => 0,
        '.' => 0b000_000_000_000_010,
        ':' => 0b000_010_000_010_000,
        '=' => 0b000_111_000_111_000,
        '-' => 0b000_000_111_000_000,
        '/' => 0b001_001_010_100_100,
        _   => 0b000_000_010_000_000, // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_midpoint_is_halfway() {
        let mid = blend(0xFF000000, 0xFFFFFFFF, 0.5);
        assert_eq!(mid, 0xFF7F7F7F);
    }

    #[test]
    fn blend_extremes_pass_through() {
        assert_eq!(blend(0xFF102030, 0xFFFFFFFF, 0.0), 0xFF102030);
        assert_eq!(blend(0xFF102030, 0xFFAABBCC, 1.0), 0xFFAABBCC);
    }

    #[test]
    fn fill_circle_covers_center_not_corners() {
        let mut c = Canvas::new(100, 100);
        c.fill_circle(50.0, 50.0, 10.0, 0xFFFF0000);
        assert_eq!(c.pixel(50, 50), 0xFFFF0000);
        assert_eq!(c.pixel(0, 0), 0xFF000000);
        assert_eq!(c.pixel(50, 65), 0xFF000000); // just outside the radius
    }

    #[test]
    fn fill_circle_clips_at_the_edge() {
        let mut c = Canvas::new(100, 100);
        // Center outside the buffer; must not panic, and the inside part draws.
        c.fill_circle(-5.0, 50.0, 10.0, 0xFFFF0000);
        assert_eq!(c.pixel(2, 50), 0xFFFF0000);
    }

    #[test]
    fn ring_marker_leaves_the_middle_open() {
        let mut c = Canvas::new(100, 100);
        c.ring_marker(50.0, 50.0, 20.0, 6.0, 0xFF00FF00);
        assert_eq!(c.pixel(50, 50), 0xFF000000); // hollow center
        assert_eq!(c.pixel(70, 50), 0xFF00FF00); // on the stroke
    }

    #[test]
    fn ring_band_blends_only_the_band() {
        let ring = RingTarget::new((100.0, 100.0), 40.0, 10.0).unwrap();
        let mut c = Canvas::new(200, 200);
        c.ring_band(&ring);
        assert_eq!(c.pixel(100, 100), 0xFF000000); // center untouched
        assert_eq!(c.pixel(100 + 60, 100), 0xFF000000); // outside untouched
        assert_ne!(c.pixel(100 + 45, 100), 0xFF000000); // mid-band blended
        // Just inside the inner edge is outside the band.
        assert_eq!(c.pixel(100 + 38, 100), 0xFF000000);
    }

    #[test]
    fn ring_band_alternates_segments() {
        let ring = RingTarget::new((200.0, 200.0), 100.0, 20.0).unwrap();
        let mut c = Canvas::new(400, 400);
        c.ring_band(&ring);
        // Angle 0 sits in the last (odd) segment, angle π/8 in segment 0.
        let odd = c.pixel(200 + 105, 200);
        let a = std::f32::consts::PI / 8.0;
        let even = c.pixel(
            (200.0 + 105.0 * a.cos()) as usize,
            (200.0 + 105.0 * a.sin()) as usize,
        );
        assert_ne!(odd, even);
    }

    #[test]
    fn label_marks_pixels() {
        let mut c = Canvas::new(50, 10);
        c.label("a1", 2, 2, 0xFFFFFFFF);
        let lit = c.data().iter().filter(|&&px| px == 0xFFFFFFFF).count();
        assert!(lit > 5);
    }

    #[test]
    fn copy_from_rejects_mismatched_frames() {
        let mut c = Canvas::new(10, 10);
        c.fill_rect(0, 0, 10, 10, 0xFFFF0000);
        c.copy_from(&[0xFFFFFFFF; 25]); // wrong size → cleared, not panicked
        assert_eq!(c.pixel(5, 5), 0xFF000000);
    }
}
