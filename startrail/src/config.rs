//! Run configuration.
//!
//! [`StartrailConfig`] is the typed configuration consumed by [`crate::run`]. It can be
//! read from YAML or JSON files. [`StartrailRequest`] mirrors the flat form of the
//! original plug-in dialog (flags, option indices) and converts into a config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compositor::CompositorSettings;
use crate::error::ConfigError;
use crate::opacity::{FadeMode, FadeSettings};
use crate::skyglow::SkyglowLevel;

/// Typed run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartrailConfig {
    /// Directory of light frames, stacked in file name order.
    pub light_frames: PathBuf,
    /// Directory of dark frames. `None` disables dark subtraction.
    pub dark_frames: Option<PathBuf>,
    /// Directory receiving `trailNNNNN.jpg` after every frame. `None` disables saving.
    pub intermediate_dir: Option<PathBuf>,
    /// Refresh the backend preview after every frame.
    pub live_display: bool,
    /// Flatten after every frame instead of keeping one layer per frame.
    pub merge_layers: bool,
    pub skyglow: SkyglowLevel,
    pub fade: FadeSettings,
}

impl Default for StartrailConfig {
    fn default() -> Self {
        Self {
            light_frames: PathBuf::new(),
            dark_frames: None,
            intermediate_dir: None,
            live_display: false,
            merge_layers: true,
            skyglow: SkyglowLevel::None,
            fade: FadeSettings::default(),
        }
    }
}

impl StartrailConfig {
    pub fn new<P: Into<PathBuf>>(light_frames: P) -> Self {
        Self {
            light_frames: light_frames.into(),
            ..Self::default()
        }
    }

    /// Checks paths and option ranges. Touches nothing but path metadata.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.light_frames.as_os_str().is_empty() {
            return Err(ConfigError::MissingLightFramePath);
        }
        if !self.light_frames.exists() {
            return Err(ConfigError::LightFramePathNotFound(
                self.light_frames.clone(),
            ));
        }
        if let Some(dark) = &self.dark_frames {
            if !dark.exists() {
                return Err(ConfigError::DarkFramePathNotFound(dark.clone()));
            }
        }
        if let Some(dir) = &self.intermediate_dir {
            if !dir.exists() {
                return Err(ConfigError::IntermediatePathNotFound(dir.clone()));
            }
        }

        check_fade_amount("fade-in amount", self.fade.in_amount)?;
        check_fade_amount("fade-out amount", self.fade.out_amount)?;

        Ok(())
    }

    pub fn compositor_settings(&self) -> CompositorSettings {
        CompositorSettings {
            merge_layers: self.merge_layers,
            skyglow: self.skyglow,
            fade_mode: self.fade.mode,
        }
    }

    /// Reads a config file, format chosen by extension (`yaml`, `yml` or `json`).
    ///
    /// Only parses; call [`Self::validate`] before use.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        match extension.as_deref() {
            Some("yaml" | "yml") => {
                serde_yml::from_str(&text).map_err(|source| ConfigError::ParseYaml {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Some("json") => serde_json::from_str(&text).map_err(|source| ConfigError::ParseJson {
                path: path.to_path_buf(),
                source,
            }),
            _ => Err(ConfigError::UnsupportedConfigFormat(path.to_path_buf())),
        }
    }
}

fn check_fade_amount(name: &'static str, value: u32) -> Result<(), ConfigError> {
    if (1..=100).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidOption {
            name,
            value,
            expected: "1-100",
        })
    }
}

/// Flat request in the shape of the plug-in dialog.
///
/// Directories are plain strings and only take effect when their flag is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartrailRequest {
    pub light_frames: String,
    pub use_dark_frames: bool,
    pub dark_frames: String,
    pub save_intermediate: bool,
    pub save_directory: String,
    pub live_display: bool,
    pub merge_layers: bool,
    /// 0 none, 1 light, 2 moderate, 3 heavy, 4 full.
    pub subtract_skyglow: u32,
    /// 0 none, 1 in, 2 out, 3 in and out.
    pub fade: u32,
    pub fade_in_amount: u32,
    pub fade_out_amount: u32,
}

impl Default for StartrailRequest {
    fn default() -> Self {
        Self {
            light_frames: String::new(),
            use_dark_frames: false,
            dark_frames: String::new(),
            save_intermediate: false,
            save_directory: String::new(),
            live_display: false,
            merge_layers: true,
            subtract_skyglow: 0,
            fade: 0,
            fade_in_amount: 100,
            fade_out_amount: 100,
        }
    }
}

impl StartrailRequest {
    /// Converts to a typed config and validates it.
    ///
    /// Path checks come first, in dialog order, then option ranges.
    pub fn validate(&self) -> Result<StartrailConfig, ConfigError> {
        let config = StartrailConfig {
            light_frames: PathBuf::from(&self.light_frames),
            dark_frames: self
                .use_dark_frames
                .then(|| PathBuf::from(&self.dark_frames)),
            intermediate_dir: self
                .save_intermediate
                .then(|| PathBuf::from(&self.save_directory)),
            live_display: self.live_display,
            merge_layers: self.merge_layers,
            skyglow: SkyglowLevel::None,
            fade: FadeSettings::new(FadeMode::None, self.fade_in_amount, self.fade_out_amount),
        };
        config.validate()?;

        let skyglow = SkyglowLevel::from_index(self.subtract_skyglow).ok_or(
            ConfigError::InvalidOption {
                name: "skyglow level",
                value: self.subtract_skyglow,
                expected: "0-4",
            },
        )?;
        let fade_mode = FadeMode::from_index(self.fade).ok_or(ConfigError::InvalidOption {
            name: "fade mode",
            value: self.fade,
            expected: "0-3",
        })?;

        Ok(StartrailConfig {
            skyglow,
            fade: FadeSettings {
                mode: fade_mode,
                ..config.fade
            },
            ..config
        })
    }
}
