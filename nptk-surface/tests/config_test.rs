// SPDX-License-Identifier: LGPL-3.0-only

use std::io::Write;

use nptk_surface::{ConfigError, SurfaceConfig};

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[surface]\ntarget_buffer_count = 3\nextra_buffers = 1").unwrap();

    let config = SurfaceConfig::load(file.path()).unwrap();
    assert_eq!(config.target_buffer_count, 3);
    assert_eq!(config.extra_buffers, 1);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = SurfaceConfig::load(dir.path().join("surface.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_load_malformed_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[surface\ntarget_buffer_count = 3").unwrap();
    assert!(matches!(
        SurfaceConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));
}
