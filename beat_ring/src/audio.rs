//! One-shot sample playback.
//!
//! Clips are decoded up front — a missing or corrupt asset stops the program
//! before the main loop ever runs — and triggers are fire-and-forget:
//! [`Sampler::play`] pushes a `SoundId` onto a bounded channel and returns
//! immediately; the cpal callback assigns it to a free voice and mixes.
//! Three tracks triggering in the same frame sound simultaneously.

use std::path::{Path, PathBuf};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use rhythm_core::SoundId;

/// Decode rate used when no output device exists and the real rate is
/// unknowable.  Assets still get decoded so bad files fail fast.
const FALLBACK_RATE: u32 = 44_100;

// ════════════════════════════════════════════════════════════════════════════
// AudioOut — dispatch seam
// ════════════════════════════════════════════════════════════════════════════

/// Fire-and-forget playback dispatch.  The frame orchestrator never blocks
/// on it and never learns whether anything actually sounded.
pub trait AudioOut {
    fn play(&self, sound: SoundId);
}

// ════════════════════════════════════════════════════════════════════════════
// Clip — a decoded sample
// ════════════════════════════════════════════════════════════════════════════

/// A decoded clip: mono f32 samples at the output device rate.
pub struct Clip {
    pub samples: Vec<f32>,
}

impl Clip {
    /// Decode a WAV file to mono f32 at `target_rate`.
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("cannot open sound asset {}", path.display()))?;
        let spec = reader.spec();

        let raw: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .with_context(|| format!("corrupt sound asset {}", path.display()))?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max))
                    .collect::<Result<_, _>>()
                    .with_context(|| format!("corrupt sound asset {}", path.display()))?
            }
        };

        // Fold interleaved channels to mono.
        let channels = spec.channels.max(1) as usize;
        let mono: Vec<f32> = raw
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        let samples = if spec.sample_rate == target_rate {
            mono
        } else {
            resample_linear(&mono, spec.sample_rate, target_rate)
        };

        Ok(Clip { samples })
    }
}

/// Linear resampler, good enough for short percussion hits.
fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src = i as f64 / ratio;
        let idx = src.floor() as usize;
        let frac = (src - idx as f64) as f32;
        let a = samples[idx.min(samples.len() - 1)];
        let b = samples[(idx + 1).min(samples.len() - 1)];
        out.push(a + (b - a) * frac);
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Mixer — runs inside the cpal callback
// ════════════════════════════════════════════════════════════════════════════

const MAX_VOICES: usize = 16; // fixed pool; the callback never allocates

#[derive(Clone, Copy)]
struct Voice {
    clip:  usize,
    pos:   usize,
    alive: bool,
}

struct Mixer {
    clips:  Vec<Clip>,
    voices: [Voice; MAX_VOICES],
    rx:     Receiver<SoundId>,
}

impl Mixer {
    fn new(clips: Vec<Clip>, rx: Receiver<SoundId>) -> Self {
        Mixer {
            clips,
            voices: [Voice { clip: 0, pos: 0, alive: false }; MAX_VOICES],
            rx,
        }
    }

    /// Start a clip on a free voice; with the pool exhausted the oldest slot
    /// is stolen.
    fn trigger(&mut self, sound: SoundId) {
        if sound.0 >= self.clips.len() {
            return;
        }
        let slot = self.voices.iter().position(|v| !v.alive).unwrap_or(0);
        self.voices[slot] = Voice { clip: sound.0, pos: 0, alive: true };
    }

    /// Drain pending triggers, then fill one interleaved output block.
    fn render(&mut self, out: &mut [f32], channels: usize) {
        while let Ok(sound) = self.rx.try_recv() {
            self.trigger(sound);
        }

        for frame in out.chunks_mut(channels) {
            let mut mixed = 0.0f32;
            for voice in &mut self.voices {
                if !voice.alive {
                    continue;
                }
                let samples = &self.clips[voice.clip].samples;
                match samples.get(voice.pos) {
                    Some(&s) => {
                        mixed += s;
                        voice.pos += 1;
                    }
                    None => voice.alive = false,
                }
                if voice.pos >= samples.len() {
                    voice.alive = false;
                }
            }
            let s = mixed.clamp(-1.0, 1.0);
            for sample in frame {
                *sample = s;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Sampler — the playback backend handle
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the playback backend.  Holds the output stream alive; dropping
/// the sampler releases the device.
pub struct Sampler {
    tx:      Option<Sender<SoundId>>,
    _stream: Option<cpal::Stream>,
}

impl AudioOut for Sampler {
    fn play(&self, sound: SoundId) {
        if let Some(tx) = &self.tx {
            // A full channel drops the trigger rather than stall a frame.
            let _ = tx.try_send(sound);
        }
    }
}

impl Sampler {
    /// Decode every clip and open the output stream.
    ///
    /// Asset errors are fatal here.  A machine without an output device gets
    /// a silent sampler and a single warning instead — the visual side of
    /// the stage still works.
    pub fn start(paths: &[PathBuf]) -> anyhow::Result<(Sampler, Vec<SoundId>)> {
        let host = cpal::default_host();
        let device = match host.default_output_device() {
            Some(d) => d,
            None => {
                eprintln!("[audio] no output device found — running silent");
                for path in paths {
                    Clip::load_wav(path, FALLBACK_RATE)?;
                }
                let ids = (0..paths.len()).map(SoundId).collect();
                return Ok((Sampler { tx: None, _stream: None }, ids));
            }
        };

        let config = device
            .default_output_config()
            .context("no default output config")?;

        match config.sample_format() {
            cpal::SampleFormat::F32 => {}
            other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported)"),
        }

        let sample_rate = config.sample_rate();
        let channels = config.channels() as usize;

        let clips = paths
            .iter()
            .map(|p| Clip::load_wav(p, sample_rate))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let ids = (0..clips.len()).map(SoundId).collect();

        let (tx, rx) = crossbeam_channel::bounded::<SoundId>(64);
        let mut mixer = Mixer::new(clips, rx);

        let err_fn = |err| eprintln!("[audio] output stream error: {err}");
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                mixer.render(data, channels);
            },
            err_fn,
            None,
        )?;
        stream.play().context("failed to start output stream")?;

        Ok((Sampler { tx: Some(tx), _stream: Some(stream) }, ids))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
