//! Scope configuration.

use crate::audio::analyser::{DEFAULT_BUFFER_LEN, MAX_BUFFER_LEN, MIN_BUFFER_LEN};
use crate::render::Scaling;
use crate::schedule::event_loop::DEFAULT_REFRESH_RATE;
use crate::util::audio::DEFAULT_SAMPLE_RATE;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

const MIN_SURFACE_EDGE: u32 = 16;
const MAX_SURFACE_EDGE: u32 = 8_192;
const MAX_FPS: f32 = 1_000.0;
const MAX_RUN_SECONDS: f32 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    pub sample_rate: f32,
    pub buffer_len: usize,
    pub scaling: Scaling,
    /// Fixed redraw rate; `None` follows the display refresh.
    pub fps: Option<f32>,
    pub refresh_rate: f32,
    pub width: u32,
    pub height: u32,
    pub run_seconds: f32,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_len: DEFAULT_BUFFER_LEN,
            scaling: Scaling::default(),
            fps: None,
            refresh_rate: DEFAULT_REFRESH_RATE,
            width: 800,
            height: 400,
            run_seconds: 2.0,
        }
    }
}

impl ScopeSettings {
    /// Clamps every field into its usable range.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            self.sample_rate = defaults.sample_rate;
        }
        self.buffer_len = self.buffer_len.clamp(MIN_BUFFER_LEN, MAX_BUFFER_LEN);
        self.scaling = self.scaling.or_defaults();
        self.fps = self
            .fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| fps.min(MAX_FPS));
        if !(self.refresh_rate.is_finite() && self.refresh_rate > 0.0) {
            self.refresh_rate = defaults.refresh_rate;
        }
        self.width = self.width.clamp(MIN_SURFACE_EDGE, MAX_SURFACE_EDGE);
        self.height = self.height.clamp(MIN_SURFACE_EDGE, MAX_SURFACE_EDGE);
        if !(self.run_seconds.is_finite() && self.run_seconds >= 0.0) {
            self.run_seconds = defaults.run_seconds;
        }
        self.run_seconds = self.run_seconds.min(MAX_RUN_SECONDS);
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let mut settings: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        settings.sanitize();
        Ok(settings)
    }

    /// Missing files are silent; unreadable ones are logged. Both yield defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|err| {
            warn!("[settings] {err:#}; using defaults");
            Self::default()
        })
    }

    /// Writes pretty JSON through a temp file so readers never see a partial file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let mut settings = self.clone();
        settings.sanitize();
        let json = serde_json::to_string_pretty(&settings).context("serializing settings")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &json)
            .and_then(|()| fs::rename(&temp_path, path))
            .with_context(|| format!("writing settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: ScopeSettings =
            serde_json::from_str(r#"{ "fps": 30.0, "scaling": { "volt_div": 0.5 } }"#)
                .expect("valid json");
        assert_eq!(settings.fps, Some(30.0));
        assert_eq!(settings.scaling, Scaling::new(0.01, 0.5));
        assert_eq!(settings.buffer_len, DEFAULT_BUFFER_LEN);
        assert_eq!(settings.sample_rate, 44_100.0);
    }

    #[test]
    fn sanitize_clamps_invalid_values() {
        let mut settings = ScopeSettings {
            sample_rate: -1.0,
            buffer_len: 1,
            scaling: Scaling::new(0.0, f64::NAN),
            fps: Some(0.0),
            refresh_rate: f32::INFINITY,
            width: 0,
            height: 100_000,
            run_seconds: -3.0,
        };
        settings.sanitize();

        assert_eq!(settings.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(settings.buffer_len, MIN_BUFFER_LEN);
        assert_eq!(settings.scaling, Scaling::default());
        assert_eq!(settings.fps, None);
        assert_eq!(settings.refresh_rate, DEFAULT_REFRESH_RATE);
        assert_eq!(settings.width, MIN_SURFACE_EDGE);
        assert_eq!(settings.height, MAX_SURFACE_EDGE);
        assert_eq!(settings.run_seconds, 2.0);
    }

    #[test]
    fn run_length_is_bounded() {
        let mut settings = ScopeSettings {
            run_seconds: 1e20,
            ..ScopeSettings::default()
        };
        settings.sanitize();
        assert_eq!(settings.run_seconds, MAX_RUN_SECONDS);
        assert!(std::time::Duration::try_from_secs_f32(settings.run_seconds).is_ok());
    }

    #[test]
    fn saves_and_loads_through_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("scope.json");
        let settings = ScopeSettings {
            fps: Some(24.0),
            scaling: Scaling::new(0.002, 0.25),
            width: 640,
            ..Default::default()
        };

        settings.save(&path).expect("save settings");
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(ScopeSettings::load(&path).expect("load settings"), settings);
    }

    #[test]
    fn broken_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("scope.json");
        fs::write(&path, "{ not json").expect("write file");

        assert!(ScopeSettings::load(&path).is_err());
        assert_eq!(ScopeSettings::load_or_default(&path), ScopeSettings::default());
        assert_eq!(
            ScopeSettings::load_or_default(&dir.path().join("missing.json")),
            ScopeSettings::default()
        );
    }
}
