//! Settings loading: defaults, then TOML file, then environment overrides.

use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::models::{CarouselSettings, Orientation};

/// Environment variable naming an explicit settings file.
pub const CONFIG_PATH_ENV: &str = "COVERFLOW_CONFIG";
/// Overrides `decode.workers`.
pub const WORKERS_ENV: &str = "COVERFLOW_DECODE_WORKERS";
/// Overrides `decode.max_dimension`.
pub const MAX_DIMENSION_ENV: &str = "COVERFLOW_MAX_DIMENSION";
/// Overrides `orientation` (`horizontal` / `vertical`).
pub const ORIENTATION_ENV: &str = "COVERFLOW_ORIENTATION";
/// Overrides `appearance.fade_alpha`.
pub const FADE_ALPHA_ENV: &str = "COVERFLOW_FADE_ALPHA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Default per-user settings location, if the platform has one.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("coverflow").join("settings.toml"))
}

/// Load settings using the full precedence chain.
///
/// An explicit `path` must exist. Otherwise `$COVERFLOW_CONFIG` is tried,
/// then the per-user default location; a missing default file is not an
/// error.
pub fn load_settings(path: Option<&Path>) -> Result<CarouselSettings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => match std::env::var_os(CONFIG_PATH_ENV) {
            Some(env_path) => read_settings_file(Path::new(&env_path))?,
            None => match default_settings_path() {
                Some(default_path) if default_path.exists() => {
                    read_settings_file(&default_path)?
                }
                _ => {
                    debug!("No settings file found, using defaults");
                    CarouselSettings::default()
                }
            },
        },
    };

    apply_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings.normalized())
}

/// Parse a TOML settings file. Values are not yet normalized.
pub fn read_settings_file(path: &Path) -> Result<CarouselSettings> {
    let content =
        std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let settings = parse_settings(&content).map_err(|source| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!("Loaded carousel settings from {}", path.display());
    Ok(settings)
}

/// Parse settings from TOML text.
pub fn parse_settings(
    content: &str,
) -> std::result::Result<CarouselSettings, toml::de::Error> {
    toml::from_str(content)
}

/// Render settings as TOML, e.g. to seed a user settings file.
pub fn to_toml_string(
    settings: &CarouselSettings,
) -> std::result::Result<String, toml::ser::Error> {
    toml::to_string_pretty(settings)
}

/// Apply environment-style overrides read through `lookup`.
///
/// Taking a lookup closure keeps this testable without mutating the
/// process environment.
pub fn apply_overrides<F>(
    settings: &mut CarouselSettings,
    lookup: F,
) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(WORKERS_ENV) {
        settings.decode.workers = parse_value(WORKERS_ENV, &raw)?;
    }
    if let Some(raw) = lookup(MAX_DIMENSION_ENV) {
        settings.decode.max_dimension = parse_value(MAX_DIMENSION_ENV, &raw)?;
    }
    if let Some(raw) = lookup(ORIENTATION_ENV) {
        settings.orientation = Orientation::from_str_lossy(&raw).ok_or(
            ConfigError::InvalidValue {
                key: ORIENTATION_ENV,
                value: raw.clone(),
            },
        )?;
    }
    if let Some(raw) = lookup(FADE_ALPHA_ENV) {
        settings.appearance.fade_alpha = parse_value(FADE_ALPHA_ENV, &raw)?;
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(
    key: &'static str,
    raw: &str,
) -> Result<T> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
