//! Command-line entry point.
//!
//! Generates quantum-random phrases and ships each one to a clip in the
//! DAW, one run per target track. The track selector lives here and is
//! advanced between runs; the generation core only ever sees an explicit
//! track parameter.

use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use qlip_core::engine::Phrase;
use qlip_core::{generate_phrase, midi_export, run_generation, CircuitSampler, OscTransport};
use qlip_types::{ClipSlot, TrackIndex};

const USAGE: &str = "usage: qlip [--track N] [--slot N] [--runs N] [--bars N] [--seed N] \
[--export PATH] [--dry-run] [--verbose]";

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("Failed to initialize logger");
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn parse_flag<T: FromStr>(value: &str, flag: &str) -> T {
    match value.parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("invalid value for {}: {}", flag, value);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let track_start: u32 = arg_value(&args, "--track")
        .map(|s| parse_flag(&s, "--track"))
        .unwrap_or(0);
    let slot_index: u32 = arg_value(&args, "--slot")
        .map(|s| parse_flag(&s, "--slot"))
        .unwrap_or(0);
    let runs: u32 = arg_value(&args, "--runs")
        .map(|s| parse_flag(&s, "--runs"))
        .unwrap_or(1)
        .max(1);
    let bars: Option<u32> = arg_value(&args, "--bars").map(|s| parse_flag(&s, "--bars"));
    let seed: Option<u64> = arg_value(&args, "--seed").map(|s| parse_flag(&s, "--seed"));
    let export: Option<PathBuf> = arg_value(&args, "--export").map(PathBuf::from);
    let dry_run = args.iter().any(|a| a == "--dry-run");

    let config = qlip_core::Config::load();
    let mut phrase_config = config.phrase_defaults();
    if let Some(bars) = bars {
        phrase_config.bars = bars.max(1);
    }

    let mut source = match seed {
        Some(s) => CircuitSampler::with_seed(s),
        None => CircuitSampler::new(),
    };

    if dry_run {
        match generate_phrase(&phrase_config, &mut source) {
            Ok(phrase) => {
                print_phrase(&phrase);
                if let Some(path) = &export {
                    if let Err(e) = midi_export::export_phrase(&phrase, phrase_config.bpm, path) {
                        eprintln!("{}", e);
                        process::exit(1);
                    }
                    println!("exported to {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("generation failed: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let transport = match OscTransport::new(config.osc_host(), config.osc_port()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("could not open OSC socket: {}", e);
            process::exit(1);
        }
    };
    let settle = config.settle_times();

    let mut track = TrackIndex::new(track_start);
    let slot = ClipSlot::new(slot_index);
    for run in 0..runs {
        match run_generation(&phrase_config, track, slot, &transport, &mut source, settle) {
            Ok(summary) => {
                println!(
                    "run {}: {} notes ({} beats) -> track {} slot {}",
                    run + 1,
                    summary.notes_sent(),
                    summary.phrase.total_beats,
                    track,
                    slot
                );
                if let Some(base) = &export {
                    let path = export_path(base, track, runs > 1);
                    match midi_export::export_phrase(&summary.phrase, phrase_config.bpm, &path) {
                        Ok(()) => println!("exported to {}", path.display()),
                        Err(e) => eprintln!("{}", e),
                    }
                }
            }
            Err(e) => {
                eprintln!("generation failed: {}", e);
                eprintln!("ensure the DAW is running with its OSC remote script active");
                process::exit(1);
            }
        }
        track = track.next();
    }
}

fn print_phrase(phrase: &Phrase) {
    println!(
        "{} notes over {} beats (chord progression {:?}):",
        phrase.notes.len(),
        phrase.total_beats,
        phrase.progression
    );
    for note in &phrase.notes {
        println!(
            "  pitch {:3}  start {:7.3}  duration {:6.3}  velocity {:3}",
            note.pitch, note.start, note.duration, note.velocity
        );
    }
}

/// With multiple runs, suffix the export name with the target track so
/// successive files do not overwrite each other.
fn export_path(base: &Path, track: TrackIndex, many: bool) -> PathBuf {
    if !many {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("phrase");
    let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("mid");
    base.with_file_name(format!("{}-track{}.{}", stem, track, ext))
}
