//! Coverflow configuration
//!
//! Settings model, clamping rules, and loading (defaults, TOML file,
//! environment overrides) for the cover-flow carousel renderer.

pub mod defaults;
pub mod loader;
pub mod models;

pub use loader::{ConfigError, load_settings, parse_settings};
pub use models::{
    AppearanceSettings, CarouselSettings, DecodeSettings, Orientation,
    PhysicsSettings, RadiusSettings, VerticalDragSettings,
};
