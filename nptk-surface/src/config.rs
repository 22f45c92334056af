// SPDX-License-Identifier: LGPL-3.0-only

//! Buffer pool configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// How many buffers the manager asks the window for.
///
/// The window's buffer count is `min_undequeued_buffers + target_buffer_count
/// + extra_buffers`, capped at the queue's maximum.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default = "SurfaceConfig::baseline", deny_unknown_fields)]
pub struct SurfaceConfig {
    /// Buffers the renderer wants for itself: one being drawn, one queued.
    ///
    /// Can be overridden via the `NPTK_SURFACE_BUFFERS` environment variable.
    pub target_buffer_count: usize,
    /// Additional buffers, e.g. to absorb frame pacing jitter.
    ///
    /// Can be overridden via the `NPTK_SURFACE_EXTRA_BUFFERS` environment variable.
    pub extra_buffers: usize,
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    surface: Option<SurfaceConfig>,
}

impl SurfaceConfig {
    /// Built-in values, ignoring the environment.
    pub const fn baseline() -> Self {
        Self {
            target_buffer_count: 2,
            extra_buffers: 0,
        }
    }

    /// Parse the `[surface]` table of a TOML document.
    ///
    /// A document without a `[surface]` table yields [SurfaceConfig::baseline].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        let config = file.surface.unwrap_or_else(Self::baseline);
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file. See [SurfaceConfig::from_toml_str].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loading surface config from {:?}", path);
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.target_buffer_count == 0 {
            return Err(ConfigError::Invalid {
                key: "target_buffer_count",
                details: "at least one buffer is needed for rendering".to_string(),
            });
        }
        Ok(())
    }

    fn apply_env(mut self) -> Self {
        if let Some(count) = env_count("NPTK_SURFACE_BUFFERS") {
            if count == 0 {
                log::warn!("NPTK_SURFACE_BUFFERS=0 ignored; at least one buffer is needed");
            } else {
                log::info!("NPTK_SURFACE_BUFFERS={} detected", count);
                self.target_buffer_count = count;
            }
        }
        if let Some(extra) = env_count("NPTK_SURFACE_EXTRA_BUFFERS") {
            log::info!("NPTK_SURFACE_EXTRA_BUFFERS={} detected", extra);
            self.extra_buffers = extra;
        }
        self
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self::baseline().apply_env()
    }
}

fn env_count(key: &str) -> Option<usize> {
    let val = std::env::var(key).ok()?;
    match val.trim().parse::<usize>() {
        Ok(count) => Some(count),
        Err(_) => {
            log::warn!("Invalid {}={}: expected a non-negative integer, ignoring", key, val);
            None
        },
    }
}
