//! Beat Ring — interactive entry point.

use std::io::{self, Write};

use beat_ring::app::{run, AppConfig};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Beat Ring — beat-synchronized rhythm visualizer       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  Landmarks: simulated performer (the mouse drives the hands)");
    println!("  Tracks:    hi-hat / snare / kick — clips loaded from the sound dir");
    println!();

    let cfg = if std::env::args().any(|a| a == "--quick") {
        println!("  Quick-start: 60 BPM, speed 3, ring 200/50, sounds/\n");
        AppConfig::default()
    } else {
        configure_interactively()
    };

    println!();
    println!("  Opening stage window…  (Q or Esc quits)");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn configure_interactively() -> AppConfig {
    let mut cfg = AppConfig::default();

    cfg.tempo_bpm = read_line("  Tempo BPM (default 60): ")
        .trim()
        .parse::<f64>()
        .unwrap_or(60.0)
        .clamp(20.0, 300.0);

    cfg.speed = read_line("  Particle speed px/frame (default 3): ")
        .trim()
        .parse::<f32>()
        .unwrap_or(3.0)
        .clamp(0.5, 30.0);

    cfg.ring_radius = read_line("  Ring radius px (default 200): ")
        .trim()
        .parse::<f32>()
        .unwrap_or(200.0)
        .clamp(40.0, 280.0);

    cfg.ring_band = read_line("  Ring band thickness px (default 50): ")
        .trim()
        .parse::<f32>()
        .unwrap_or(50.0)
        .clamp(5.0, 120.0);

    let dir = read_line("  Sound directory (default sounds): ");
    if !dir.trim().is_empty() {
        cfg.sound_dir = dir.trim().into();
    }

    cfg
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
