//! vibe CLI — crowd-vibe capture and Bollywood song matcher in a terminal.
//!
//! Commands:
//!   vibe run [--seed N] [--config P] [--catalog P]   Interactive session
//!   vibe match <scale> [scale...] [--catalog P]      Best match for labels
//!   vibe catalog [--catalog P]                       List catalog songs
//!   vibe scales                                      List the scale universe
//!   vibe sample [--seed N]                           Sample a detected set

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use vibe_core::{
    is_known_scale, CaptureEvent, CapturePhase, Catalog, Engine, EngineConfig, RandomSource,
    Recommendation, ScreenKind, SeededRandom, SessionEvent, SessionSnapshot,
    DETECTED_SCALE_COUNT, SCALE_UNIVERSE,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return;
    }

    let result = match args[0].as_str() {
        "run" => cmd_run(&args[1..]),
        "match" => cmd_match(&args[1..]),
        "catalog" => cmd_catalog(&args[1..]),
        "scales" => {
            cmd_scales();
            Ok(())
        }
        "sample" => cmd_sample(&args[1..]),
        other => {
            eprintln!("unknown command: {}", other);
            print_usage();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Options {
    seed: Option<u64>,
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    positional: Vec<String>,
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut opts = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                let seed = value
                    .parse()
                    .map_err(|_| format!("invalid seed: {}", value))?;
                opts.seed = Some(seed);
            }
            "--config" => {
                opts.config = Some(iter.next().ok_or("--config needs a path")?.into());
            }
            "--catalog" => {
                opts.catalog = Some(iter.next().ok_or("--catalog needs a path")?.into());
            }
            _ => opts.positional.push(arg.clone()),
        }
    }
    Ok(opts)
}

fn load_config(opts: &Options) -> Result<EngineConfig, String> {
    let mut config = match &opts.config {
        Some(path) => EngineConfig::load(path),
        None => EngineConfig::from_env(),
    }
    .map_err(|e| e.to_string())?;

    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    if opts.catalog.is_some() {
        config.catalog_path = opts.catalog.clone();
    }
    Ok(config)
}

fn load_catalog(opts: &Options) -> Result<Catalog, String> {
    match &opts.catalog {
        Some(path) => Catalog::load(path).map_err(|e| e.to_string()),
        None => Ok(Catalog::builtin()),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_run(args: &[String]) -> Result<(), String> {
    let opts = parse_options(args)?;
    let config = load_config(&opts)?;
    log::info!(
        "vibe: countdown {}s, recording {}ms, seed {:?}",
        config.countdown_secs,
        config.recording_ms,
        config.seed
    );
    let engine = Engine::new(config).map_err(|e| e.to_string())?;
    engine.start();

    let events = engine.subscribe();
    let input = spawn_input_reader();

    print_landing();
    loop {
        for event in events.try_iter() {
            handle_event(&event);
        }

        if let SessionSnapshot::Capture {
            phase,
            progress_percent,
            crowd_voices,
            level_bars,
            ..
        } = engine.snapshot()
        {
            print_capture(&phase, progress_percent, crowd_voices, level_bars, &engine);
        }

        match input.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => match line.trim() {
                "q" => break,
                "l" => {
                    if let Err(e) = engine.toggle_like() {
                        println!("  {}", e);
                    }
                }
                "" => {
                    let result = match engine.screen() {
                        ScreenKind::Landing => engine.start_capture(),
                        ScreenKind::Capture | ScreenKind::Presenter => engine.cancel_or_reset(),
                    };
                    if let Err(e) = result {
                        println!("\n  {}", e);
                    }
                }
                other => println!("  unknown key: {}", other),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    engine.shutdown();
    Ok(())
}

fn cmd_match(args: &[String]) -> Result<(), String> {
    let opts = parse_options(args)?;
    if opts.positional.is_empty() {
        return Err("usage: vibe match <scale> [scale...] [--catalog P]".into());
    }
    for label in &opts.positional {
        if !is_known_scale(label) {
            eprintln!("warning: '{}' is not one of the ten scales", label);
        }
    }
    let catalog = load_catalog(&opts)?;
    let rec = catalog
        .best_match(opts.positional.as_slice())
        .map_err(|e| e.to_string())?;
    print_card(&rec);
    Ok(())
}

fn cmd_catalog(args: &[String]) -> Result<(), String> {
    let opts = parse_options(args)?;
    let catalog = load_catalog(&opts)?;
    for (i, song) in catalog.iter().enumerate() {
        println!(
            "  {:>2}. {} -- {} ({}, {})",
            i + 1,
            song.title,
            song.artist,
            song.movie,
            song.year
        );
        println!("      scales: {}", song.scales.join(", "));
        println!("      {} | {} | {}", song.vibe, song.tempo, song.energy);
    }
    println!("  {} song(s)", catalog.len());
    Ok(())
}

fn cmd_scales() {
    for scale in SCALE_UNIVERSE {
        println!("  {}", scale);
    }
}

fn cmd_sample(args: &[String]) -> Result<(), String> {
    let seed = sample_seed(&parse_options(args)?)?;
    let mut rng = SeededRandom::from_seed_option(seed);
    let detected = rng.sample_scales(&SCALE_UNIVERSE, DETECTED_SCALE_COUNT);
    let rec = Catalog::builtin()
        .best_match(detected.as_slice())
        .map_err(|e| e.to_string())?;
    print_card(&rec);
    Ok(())
}

/// `--seed N`, or a bare positional seed for older scripts.
fn sample_seed(opts: &Options) -> Result<Option<u64>, String> {
    if opts.seed.is_some() {
        return Ok(opts.seed);
    }
    match opts.positional.first() {
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid seed: {}", s)),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn handle_event(event: &SessionEvent) {
    match event {
        SessionEvent::ScreenChanged {
            screen: ScreenKind::Landing,
        } => {
            println!();
            print_landing();
        }
        SessionEvent::ScreenChanged {
            screen: ScreenKind::Capture,
        } => println!("  (Enter to cancel)"),
        SessionEvent::Capture(CaptureEvent::Cancelled) => println!("\n  capture cancelled"),
        SessionEvent::Capture(CaptureEvent::Completed { detected }) => {
            println!("\n  detected: {}", detected.join(", "));
        }
        SessionEvent::MatchFound { recommendation } => print_card(recommendation),
        SessionEvent::LikeToggled { liked } => {
            println!("  {}", if *liked { "liked" } else { "unliked" });
        }
        _ => {}
    }
}

fn print_landing() {
    println!("  VibeAlchemy -- what is the crowd feeling?");
    println!("  Enter: capture the vibe   q: quit");
}

fn print_capture(phase: &CapturePhase, progress: u32, voices: u32, bars: usize, engine: &Engine) {
    let window_ms = engine.config().recording_ms;
    match phase {
        CapturePhase::Countdown { remaining } => {
            print!("\r  Get ready... {}          ", remaining);
        }
        CapturePhase::Recording { elapsed_ms, .. } => {
            print!(
                "\r  Listening [{}{}] {} / {}  {}%  {} voices    ",
                "|".repeat(bars),
                " ".repeat(vibe_core::capture::LEVEL_BARS.saturating_sub(bars)),
                fmt_secs(*elapsed_ms),
                fmt_secs(window_ms),
                progress,
                voices,
            );
        }
        CapturePhase::Analyzing => {
            print!("\r  Analyzing crowd vibes...                              ");
        }
        CapturePhase::Complete { .. } | CapturePhase::Cancelled => return,
    }
    std::io::stdout().flush().ok();
}

/// Enter on the presenter returns to landing; a second Enter records.
const PRESENTER_KEYS: &str = "Enter: start over   l: like   q: quit";

fn print_card(rec: &Recommendation) {
    let song = &rec.song;
    println!();
    println!("  Detected scales: {}", rec.detected.join(", "));
    println!();
    println!("  {}", song.title);
    println!("    {} -- {} ({})", song.artist, song.movie, song.year);
    println!(
        "    Vibe match: {}%  ({} of {} scales)",
        rec.match_percentage, rec.match_count, DETECTED_SCALE_COUNT
    );
    println!(
        "    Vibe: {}  Tempo: {}  Energy: {}",
        song.vibe, song.tempo, song.energy
    );
    let hits: Vec<String> = rec
        .scale_hits()
        .into_iter()
        .map(|h| if h.detected { format!("[{}]", h.scale) } else { h.scale })
        .collect();
    println!("    Matching scales: {}", hits.join("  "));
    println!("    > Play on Spotify");
    println!();
    println!("  {}", PRESENTER_KEYS);
}

fn fmt_secs(ms: u64) -> String {
    format!("{}.{}s", ms / 1000, (ms % 1000) / 100)
}

fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}

fn print_usage() {
    println!("vibe - capture the crowd's vibe, get a Bollywood song");
    println!();
    println!("usage: vibe <command> [args]");
    println!();
    println!("commands:");
    println!("  run [--seed N] [--config P] [--catalog P]   Interactive session");
    println!("  match <scale> [scale...] [--catalog P]      Best match for scale labels");
    println!("  catalog [--catalog P]                       List catalog songs");
    println!("  scales                                      List the ten scales");
    println!("  sample [--seed N]                           Sample three scales and match");
    println!();
    println!("environment:");
    println!("  VIBE_ALCHEMY_CONFIG   Path to a JSON engine config");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_options_reads_flags_and_positionals() {
        let opts = parse_options(&args(&["C Major", "--seed", "42", "--catalog", "songs.json"])).unwrap();
        assert_eq!(opts.seed, Some(42));
        assert_eq!(opts.catalog, Some(PathBuf::from("songs.json")));
        assert_eq!(opts.positional, vec!["C Major".to_string()]);
    }

    #[test]
    fn parse_options_rejects_missing_or_bad_values() {
        assert!(parse_options(&args(&["--seed"])).is_err());
        assert!(parse_options(&args(&["--seed", "abc"])).is_err());
        assert!(parse_options(&args(&["--config"])).is_err());
    }

    #[test]
    fn sample_accepts_seed_flag_or_positional() {
        let flag = parse_options(&args(&["--seed", "7"])).unwrap();
        assert_eq!(sample_seed(&flag), Ok(Some(7)));

        let bare = parse_options(&args(&["9"])).unwrap();
        assert_eq!(sample_seed(&bare), Ok(Some(9)));

        let none = parse_options(&args(&[])).unwrap();
        assert_eq!(sample_seed(&none), Ok(None));

        let bad = parse_options(&args(&["nine"])).unwrap();
        assert!(sample_seed(&bad).is_err());
    }

    #[test]
    fn presenter_prompt_says_start_over() {
        assert!(PRESENTER_KEYS.starts_with("Enter: start over"));
        assert!(!PRESENTER_KEYS.contains("record again"));
    }

    #[test]
    fn fmt_secs_keeps_one_decimal() {
        assert_eq!(fmt_secs(0), "0.0s");
        assert_eq!(fmt_secs(3_250), "3.2s");
        assert_eq!(fmt_secs(10_000), "10.0s");
    }
}
