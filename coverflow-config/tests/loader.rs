//! Settings file loading against real files on disk.

use std::io::Write;

use coverflow_config::loader::{ConfigError, read_settings_file};
use coverflow_config::{Orientation, load_settings};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn explicit_file_is_loaded_and_normalized() {
    init_logging();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
orientation = "vertical"

[radii]
visible = 9
prefetch = 4
keep = 2

[appearance]
fade_alpha = 1.7
side_scale = 0.0
"#
    )
    .unwrap();

    let settings = load_settings(Some(file.path())).unwrap();

    assert_eq!(settings.orientation, Orientation::Vertical);
    assert_eq!(settings.radii.visible, 9);
    assert!(settings.radii.prefetch >= settings.radii.visible);
    assert!(settings.radii.keep >= settings.radii.prefetch);
    assert_eq!(settings.appearance.fade_alpha, 1.0);
    assert_eq!(settings.appearance.side_scale, 0.1);
    assert!(!settings.reflections_enabled());
}

#[test]
fn missing_explicit_file_is_an_io_error() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let err = read_settings_file(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn malformed_file_is_a_parse_error() {
    init_logging();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[radii\nvisible = ").unwrap();

    let err = load_settings(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}
