//! Stage configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{StageError, StageResult};

/// Global stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Where frame assets live and how they are probed.
    pub assets: AssetConfig,

    /// Sequence catalog entries.
    pub sequences: Vec<SequenceEntry>,

    /// Intro flip-book sequences.
    pub intro: IntroConfig,

    /// Carousel cards shown in the main view.
    pub cards: Vec<CardEntry>,

    /// Playback defaults.
    pub playback: PlaybackDefaults,

    /// Camera auto-framing parameters.
    pub camera: CameraConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Asset addressing and probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Prefix placed before `/image-sequences/...`.
    ///
    /// Empty by default so locators are root-relative.
    pub base_path: String,

    /// Maximum number of frames probed per sequence.
    pub probe_ceiling: u32,

    /// Extra attempts for a failing probe before it ends the sequence.
    pub max_probe_retries: u32,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEntry {
    /// Opaque sequence name, also the asset directory name.
    pub name: String,

    /// Asset number of the first frame.
    pub start_frame: u32,
}

/// Intro sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    /// Sequence looped while waiting for the user.
    pub idle_sequence: String,

    /// Sequence played once when the user advances.
    pub transition_sequence: String,

    /// Intro playback rate (frames per second).
    pub frame_rate: f64,
}

/// One carousel card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardEntry {
    pub id: String,
    pub sequence: String,
    pub title: String,
    pub description: String,
    pub date: String,
}

/// Playback defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackDefaults {
    /// Card flip-book rate (frames per second).
    pub card_frame_rate: f64,

    /// Display refresh rate used by simulated loops (Hz).
    pub refresh_hz: u32,
}

/// Camera auto-framing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Multiplier on the object's largest dimension (> 1).
    pub padding_factor: f64,

    /// Fraction of the remaining distance covered per tick.
    pub blend_factor: f64,

    /// Camera direction from the object center, scaled by distance.
    pub offset: [f64; 3],

    /// Lower zoom bound.
    pub min_zoom: f64,

    /// Upper zoom bound.
    pub max_zoom: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "flipstage=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            assets: AssetConfig::default(),
            sequences: vec![
                SequenceEntry::new("box-idle", 1),
                SequenceEntry::new("falling", 122),
                SequenceEntry::new("intro-idle", 1),
                SequenceEntry::new("intro-transition", 1),
            ],
            intro: IntroConfig::default(),
            cards: vec![
                CardEntry {
                    id: "1".to_string(),
                    sequence: "box-idle".to_string(),
                    title: "Barbie".to_string(),
                    description: "Nicola Coughlan".to_string(),
                    date: "July 21".to_string(),
                },
                CardEntry {
                    id: "2".to_string(),
                    sequence: "falling".to_string(),
                    title: "Coffee & Spin".to_string(),
                    description: "Some Other Description".to_string(),
                    date: "July 22".to_string(),
                },
                CardEntry {
                    id: "3".to_string(),
                    sequence: "box-idle".to_string(),
                    title: "Third Starburst".to_string(),
                    description: "Yet Another Person".to_string(),
                    date: "July 23".to_string(),
                },
            ],
            playback: PlaybackDefaults::default(),
            camera: CameraConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SequenceEntry {
    pub fn new(name: impl Into<String>, start_frame: u32) -> Self {
        Self {
            name: name.into(),
            start_frame,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            probe_ceiling: 1000,
            max_probe_retries: 0,
        }
    }
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            idle_sequence: "intro-idle".to_string(),
            transition_sequence: "intro-transition".to_string(),
            frame_rate: 12.0,
        }
    }
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            card_frame_rate: 12.0,
            refresh_hz: 60,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            padding_factor: 1.2,
            blend_factor: 0.05,
            offset: [0.0, 0.25, 1.0],
            min_zoom: 0.25,
            max_zoom: 4.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl StageConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> StageResult<Self> {
        if !path.exists() {
            return Err(StageError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> StageResult<()> {
        if self.intro.frame_rate <= 0.0 || !self.intro.frame_rate.is_finite() {
            return Err(StageError::config("intro.frame_rate must be positive"));
        }
        if self.playback.card_frame_rate <= 0.0 || !self.playback.card_frame_rate.is_finite() {
            return Err(StageError::config(
                "playback.card_frame_rate must be positive",
            ));
        }
        if self.playback.refresh_hz == 0 {
            return Err(StageError::config("playback.refresh_hz must be positive"));
        }
        if self.camera.padding_factor <= 1.0 {
            return Err(StageError::config(
                "camera.padding_factor must be greater than 1",
            ));
        }
        if !(self.camera.blend_factor > 0.0 && self.camera.blend_factor <= 1.0) {
            return Err(StageError::config("camera.blend_factor must be in (0, 1]"));
        }
        if self.camera.min_zoom <= 0.0 || self.camera.min_zoom > self.camera.max_zoom {
            return Err(StageError::config(
                "camera zoom bounds must satisfy 0 < min_zoom <= max_zoom",
            ));
        }

        let known = |name: &str| self.sequences.iter().any(|s| s.name == name);
        for name in [&self.intro.idle_sequence, &self.intro.transition_sequence] {
            if !known(name) {
                return Err(StageError::config(format!(
                    "intro references unknown sequence '{name}'"
                )));
            }
        }
        for card in &self.cards {
            if !known(&card.sequence) {
                return Err(StageError::config(format!(
                    "card '{}' references unknown sequence '{}'",
                    card.id, card.sequence
                )));
            }
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("flipstage").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.assets.probe_ceiling, 1000);
        assert_eq!(config.cards.len(), 3);
    }

    #[test]
    fn test_rejects_card_with_unknown_sequence() {
        let mut config = StageConfig::default();
        config.cards[0].sequence = "missing".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_rejects_padding_not_above_one() {
        let mut config = StageConfig::default();
        config.camera.padding_factor = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = StageConfig::default();
        config.assets.base_path = "/srv/site".to_string();
        config.save_to(&path).unwrap();

        let loaded = StageConfig::load_from(&path).unwrap();
        assert_eq!(loaded.assets.base_path, "/srv/site");
        assert_eq!(loaded.sequences, config.sequences);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: StageConfig =
            serde_json::from_str(r#"{ "assets": { "base_path": "cdn" } }"#).unwrap();
        assert_eq!(config.assets.base_path, "cdn");
        assert_eq!(config.assets.probe_ceiling, 1000);
        assert_eq!(config.intro.frame_rate, 12.0);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = StageConfig::load_from(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, StageError::FileNotFound { .. }));
    }
}
