use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use domainplot_core::{ColorParams, PlotRequest};
use domainplot_render::EXPORT_HEIGHT;

const FILE_NAME: &str = "preferences.json";

/// User preferences, read once at start-up. Never written back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_expression")]
    pub default_expression: String,
    #[serde(default = "default_upper")]
    pub re_upper: f64,
    #[serde(default = "default_lower")]
    pub re_lower: f64,
    #[serde(default = "default_upper")]
    pub im_upper: f64,
    #[serde(default = "default_lower")]
    pub im_lower: f64,
    /// Height in pixels of exported images; the width follows the viewport.
    #[serde(default = "default_export_height")]
    pub export_height: u32,
    /// Lightness reached as the modulus grows without bound.
    #[serde(default = "default_lightness_max")]
    pub lightness_max: f64,
    #[serde(default = "default_preview_width")]
    pub preview_width: u32,
    #[serde(default = "default_preview_height")]
    pub preview_height: u32,
    /// Where exports go when no path is given. When empty, an `images/`
    /// folder next to the executable is used.
    #[serde(default)]
    pub images_dir: String,
}

fn default_expression() -> String {
    "z".to_string()
}
fn default_upper() -> f64 {
    15.0
}
fn default_lower() -> f64 {
    -15.0
}
fn default_export_height() -> u32 {
    EXPORT_HEIGHT
}
fn default_lightness_max() -> f64 {
    ColorParams::DEFAULT_LIGHTNESS_MAX
}
fn default_preview_width() -> u32 {
    640
}
fn default_preview_height() -> u32 {
    480
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_expression: default_expression(),
            re_upper: default_upper(),
            re_lower: default_lower(),
            im_upper: default_upper(),
            im_lower: default_lower(),
            export_height: default_export_height(),
            lightness_max: default_lightness_max(),
            preview_width: default_preview_width(),
            preview_height: default_preview_height(),
            images_dir: String::new(),
        }
    }
}

impl Preferences {
    /// Load preferences from the OS config directory or, failing that, from
    /// next to the executable. Falls back to defaults.
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No preferences file found");
                Self::default()
            }
        }
    }

    /// Load preferences from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Preferences>(&json) {
                Ok(prefs) => {
                    info!("Loaded preferences from {}", path.display());
                    prefs
                }
                Err(e) => {
                    error!("Failed to parse preferences: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read preferences file: {e}");
                Self::default()
            }
        }
    }

    pub fn color_params(&self) -> ColorParams {
        ColorParams::with_lightness_max(self.lightness_max)
    }

    /// The plot to show before anything is submitted.
    ///
    /// Invalid stored defaults are logged and replaced by the identity plot.
    pub fn initial_request(&self) -> PlotRequest {
        let fields =
            [self.re_upper, self.re_lower, self.im_upper, self.im_lower].map(|b| b.to_string());
        match PlotRequest::from_fields(
            &self.default_expression,
            &fields[0],
            &fields[1],
            &fields[2],
            &fields[3],
        ) {
            Ok(request) => request,
            Err(e) => {
                warn!("Ignoring invalid default plot: {e}");
                PlotRequest::default()
            }
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        if self.images_dir.is_empty() {
            crate::app_dir::images_directory()
        } else {
            PathBuf::from(&self.images_dir)
        }
    }
}

fn config_path() -> Option<PathBuf> {
    crate::app_dir::config_directory()
        .map(|dir| dir.join(FILE_NAME))
        .into_iter()
        .chain(std::iter::once(crate::app_dir::exe_directory().join(FILE_NAME)))
        .find(|path| path.exists())
}
