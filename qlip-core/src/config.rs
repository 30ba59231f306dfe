//! Layered TOML configuration.
//!
//! An embedded `config.toml` supplies every default; a user copy at
//! `<config dir>/qlip/config.toml` overrides individual keys. Malformed or
//! unreadable user config is logged and ignored rather than aborting.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use qlip_types::music::{
    default_chord_table, ChordTemplate, DurationPalette, PhraseConfig, ScheduleMode,
};

use crate::run::SettleTimes;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    osc: OscConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    bpm: Option<u16>,
    bars: Option<u32>,
    bar_beats: Option<f64>,
    mode: Option<String>,
    notes_per_bar: Option<u32>,
    velocity: Option<u8>,
    durations: Option<Vec<f64>>,
    chords: Option<Vec<[u8; 3]>>,
}

#[derive(Deserialize, Default)]
struct OscConfig {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    create_settle_ms: Option<u64>,
    send_settle_ms: Option<u64>,
}

pub struct Config {
    defaults: DefaultsConfig,
    osc: OscConfig,
    runtime: RuntimeConfig,
}

impl Config {
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_osc(&mut base.osc, user.osc);
                            merge_runtime(&mut base.runtime, user.runtime);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            osc: base.osc,
            runtime: base.runtime,
        }
    }

    /// Phrase settings assembled from the layered defaults.
    pub fn phrase_defaults(&self) -> PhraseConfig {
        let fallback = PhraseConfig::default();
        let notes_per_bar = self.defaults.notes_per_bar.unwrap_or(4).max(1);
        let mode = match self.defaults.mode.as_deref().and_then(parse_mode) {
            Some(ModeTag::Fixed) => ScheduleMode::FixedCount {
                notes_per_bar,
                note_beats: None,
            },
            Some(ModeTag::Variable) => ScheduleMode::VariableDuration,
            None => fallback.mode,
        };
        PhraseConfig {
            chords: self
                .defaults
                .chords
                .as_ref()
                .map(|table| table.iter().map(|&c| ChordTemplate::new(c)).collect())
                .filter(|table: &Vec<ChordTemplate>| !table.is_empty())
                .unwrap_or_else(default_chord_table),
            durations: self
                .defaults
                .durations
                .clone()
                .map(DurationPalette::new)
                .unwrap_or(fallback.durations),
            bar_beats: self.defaults.bar_beats.unwrap_or(fallback.bar_beats),
            mode,
            bars: self.defaults.bars.unwrap_or(fallback.bars).max(1),
            bpm: self.defaults.bpm.unwrap_or(fallback.bpm),
            velocity: self.defaults.velocity.unwrap_or(fallback.velocity).min(127),
        }
    }

    pub fn osc_host(&self) -> &str {
        self.osc.host.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn osc_port(&self) -> u16 {
        self.osc.port.unwrap_or(11_000)
    }

    /// Settle pauses, clamped to at most ten seconds each.
    pub fn settle_times(&self) -> SettleTimes {
        let fallback = SettleTimes::default();
        let clamp = |ms: u64| Duration::from_millis(ms.min(10_000));
        SettleTimes {
            after_create: self
                .runtime
                .create_settle_ms
                .map(clamp)
                .unwrap_or(fallback.after_create),
            after_notes: self
                .runtime
                .send_settle_ms
                .map(clamp)
                .unwrap_or(fallback.after_notes),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("qlip").join("config.toml"))
}

enum ModeTag {
    Fixed,
    Variable,
}

fn parse_mode(s: &str) -> Option<ModeTag> {
    match s.to_lowercase().as_str() {
        "fixed" => Some(ModeTag::Fixed),
        "variable" => Some(ModeTag::Variable),
        _ => None,
    }
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.bars.is_some() {
        base.bars = user.bars;
    }
    if user.bar_beats.is_some() {
        base.bar_beats = user.bar_beats;
    }
    if user.mode.is_some() {
        base.mode = user.mode;
    }
    if user.notes_per_bar.is_some() {
        base.notes_per_bar = user.notes_per_bar;
    }
    if user.velocity.is_some() {
        base.velocity = user.velocity;
    }
    if user.durations.is_some() {
        base.durations = user.durations;
    }
    if user.chords.is_some() {
        base.chords = user.chords;
    }
}

fn merge_osc(base: &mut OscConfig, user: OscConfig) {
    if user.host.is_some() {
        base.host = user.host;
    }
    if user.port.is_some() {
        base.port = user.port;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.create_settle_ms.is_some() {
        base.create_settle_ms = user.create_settle_ms;
    }
    if user.send_settle_ms.is_some() {
        base.send_settle_ms = user.send_settle_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded() -> Config {
        let base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap();
        Config {
            defaults: base.defaults,
            osc: base.osc,
            runtime: base.runtime,
        }
    }

    #[test]
    fn embedded_config_parses_with_expected_defaults() {
        let config = embedded();
        let phrase = config.phrase_defaults();
        assert_eq!(phrase.bpm, 120);
        assert_eq!(phrase.bars, 4);
        assert!((phrase.bar_beats - 4.0).abs() < f64::EPSILON);
        assert_eq!(phrase.mode, ScheduleMode::VariableDuration);
        assert_eq!(phrase.chords.len(), 6);
        assert_eq!(phrase.chords[0].pitches(), [60, 64, 67]);
        assert_eq!(phrase.durations.entries(), &[0.5, 1.0, 2.0]);
        assert_eq!(phrase.velocity, 100);
        assert!(phrase.validate().is_ok());
    }

    #[test]
    fn embedded_osc_defaults() {
        let config = embedded();
        assert_eq!(config.osc_host(), "127.0.0.1");
        assert_eq!(config.osc_port(), 11_000);
    }

    #[test]
    fn settle_times_clamped() {
        let config = Config {
            defaults: DefaultsConfig::default(),
            osc: OscConfig::default(),
            runtime: RuntimeConfig {
                create_settle_ms: Some(999_999),
                send_settle_ms: Some(100),
            },
        };
        let settle = config.settle_times();
        assert_eq!(settle.after_create, Duration::from_secs(10));
        assert_eq!(settle.after_notes, Duration::from_millis(100));
    }

    #[test]
    fn user_merge_overrides_individual_keys() {
        let mut base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap();
        let user: ConfigFile = toml::from_str(
            r#"
            [defaults]
            bpm = 90
            mode = "fixed"
            notes_per_bar = 8
            "#,
        )
        .unwrap();
        merge_defaults(&mut base.defaults, user.defaults);
        let config = Config {
            defaults: base.defaults,
            osc: base.osc,
            runtime: base.runtime,
        };
        let phrase = config.phrase_defaults();
        assert_eq!(phrase.bpm, 90);
        assert_eq!(
            phrase.mode,
            ScheduleMode::FixedCount {
                notes_per_bar: 8,
                note_beats: None
            }
        );
        // Untouched keys keep their embedded values.
        assert_eq!(phrase.bars, 4);
        assert_eq!(phrase.chords.len(), 6);
    }

    #[test]
    fn parse_mode_accepts_known_tags() {
        assert!(matches!(parse_mode("fixed"), Some(ModeTag::Fixed)));
        assert!(matches!(parse_mode("Variable"), Some(ModeTag::Variable)));
        assert!(parse_mode("swing").is_none());
    }
}
