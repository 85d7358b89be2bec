//! pinch_canvas: interactive entry point.
//!
//! ```text
//! pinch_canvas [--quick] [--save-config] [--pipe <command> [args…]]
//! ```

use pinch_canvas::app::{run, AppConfig, SourceKind};
use pinch_canvas::config::Config;
use pinch_ink::{Color, MAX_WIDTH, MIN_WIDTH};
use std::io::{self, Write};

fn main() {
    env_logger::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Pinch Canvas - draw in the air with one hand          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let quick       = args.iter().any(|a| a == "--quick");
    let save_config = args.iter().any(|a| a == "--save-config");

    // Everything after --pipe is the detector command line.
    let source = match args.iter().position(|a| a == "--pipe") {
        Some(i) => match args.get(i + 1) {
            Some(command) => SourceKind::Pipe {
                command: command.clone(),
                args:    args[i + 2..].to_vec(),
            },
            None => {
                eprintln!("Error: --pipe needs a detector command");
                std::process::exit(2);
            }
        },
        None => SourceKind::Simulated,
    };

    match &source {
        SourceKind::Simulated => {
            println!("  Mode: Mouse simulation  (use --pipe <detector> for a camera)");
        }
        SourceKind::Pipe { command, .. } => {
            println!("  Mode: Detector pipe  ({})", command);
        }
    }
    println!();

    let mut config = Config::load();
    if quick {
        println!("  Quick-start: saved settings, brush {} {}px\n",
            config.brush_color, config.brush_width);
    } else {
        configure_interactively(&mut config);
    }

    if save_config {
        match config.save() {
            Ok(path) => println!("  Settings saved to {}", path.display()),
            Err(e)   => eprintln!("  Could not save settings: {}", e),
        }
    }

    println!();
    println!("  Opening canvas window…");
    println!();

    if let Err(e) = run(AppConfig::from(&config), source) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure_interactively(config: &mut Config) {
    println!("  Brush color:");
    for (i, hex) in config.palette.iter().enumerate().take(10) {
        print!("    {}={}", (i + 1) % 10, hex);
        if i % 5 == 4 { println!(); }
    }
    println!();
    let choice = read_line(&format!("  Choice 1–0 or #rrggbb (default {}): ", config.brush_color));
    let choice = choice.trim();
    if let Some(hex) = pick_color(choice, &config.palette) {
        config.brush_color = hex;
    } else if !choice.is_empty() {
        println!("    ⚠  not a color, keeping {}", config.brush_color);
    }

    let width = loop {
        let line = read_line(&format!(
            "  Brush size {}–{} px (default {}): ", MIN_WIDTH, MAX_WIDTH, config.brush_width
        ));
        if line.trim().is_empty() { break config.brush_width; }
        match line.trim().parse::<f32>() {
            Ok(w) if (MIN_WIDTH..=MAX_WIDTH).contains(&w) => break w,
            _ => println!("    ⚠  {}–{} only.", MIN_WIDTH, MAX_WIDTH),
        }
    };
    config.brush_width = width;
}

/// A palette key (`1`–`9`, `0` for the tenth) or a literal color.
fn pick_color(choice: &str, palette: &[String]) -> Option<String> {
    if let Ok(n) = choice.parse::<usize>() {
        let idx = if n == 0 { 9 } else { n - 1 };
        return palette.get(idx).cloned();
    }
    Color::from_hex(choice).ok().map(|c| c.to_hex())
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
