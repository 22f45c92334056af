// SPDX-License-Identifier: LGPL-3.0-only

//! # Surface Error Types
//!
//! Errors reported by the [SurfaceManager](crate::SurfaceManager) and its
//! configuration layer.

use std::path::PathBuf;
use thiserror::Error;

use crate::color::{ColorMode, ColorSpace, ColorType, PixelFormat};
use crate::geometry::PixelSize;
use crate::usage::BufferUsage;
use crate::window::BufferId;

/// Boxed error coming from a window or GPU collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while managing a window's buffer pool.
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// The window refused the requested size/format/usage/transform.
    #[error("Window rejected buffer configuration: {source}")]
    ConfigurationRejected {
        /// The window's error.
        #[source]
        source: BoxError,
    },

    /// The window geometry could not be resolved to a drawable size.
    #[error("Window geometry resolves to a degenerate size {size}")]
    DegenerateSize {
        /// The offending size.
        size: PixelSize,
    },

    /// The color type and color space have no matching dataspace.
    #[error("Unsupported color configuration {color_type:?} in {color_space:?} ({mode:?})")]
    UnsupportedColor {
        /// Requested color mode.
        mode: ColorMode,
        /// Requested color type.
        color_type: ColorType,
        /// Requested color space.
        color_space: ColorSpace,
    },

    /// The GPU context cannot render into buffers of this format and usage.
    #[error("GPU cannot use {format:?} buffers with usage {required:?}")]
    UnsupportedUsage {
        /// The buffer format.
        format: PixelFormat,
        /// The usage the manager needs.
        required: BufferUsage,
    },

    /// Querying the window's metrics failed.
    #[error("Failed to query window metrics: {source}")]
    QueryFailed {
        /// The window's error.
        #[source]
        source: BoxError,
    },

    /// The window could not hand out a buffer.
    #[error("Failed to dequeue a buffer: {source}")]
    AcquisitionFailed {
        /// The window's error.
        #[source]
        source: BoxError,
    },

    /// The GPU backend could not wrap a buffer as a drawable surface.
    #[error("Failed to wrap buffer {buffer:?} at {size}: {source}")]
    WrapFailed {
        /// The buffer that could not be wrapped.
        buffer: BufferId,
        /// The size it was wrapped at.
        size: PixelSize,
        /// The GPU context's error.
        #[source]
        source: BoxError,
    },

    /// The window rejected the queued buffer. The buffer stays dequeued.
    #[error("Failed to present buffer {buffer:?}: {source}")]
    PresentFailed {
        /// The buffer that is still dequeued.
        buffer: BufferId,
        /// The window's error.
        #[source]
        source: BoxError,
    },

    /// The window refused to take a canceled buffer back.
    #[error("Failed to cancel buffer {buffer:?}: {source}")]
    CancelFailed {
        /// The buffer being canceled.
        buffer: BufferId,
        /// The window's error.
        #[source]
        source: BoxError,
    },

    /// Present or cancel was requested with no buffer dequeued.
    #[error("No buffer is currently dequeued")]
    NoCurrentBuffer,

    /// The operation needs the manager to be idle, but a buffer is dequeued.
    #[error("Buffer {buffer:?} is still dequeued; present or cancel it first")]
    BufferDequeued {
        /// The buffer currently in flight.
        buffer: BufferId,
    },
}

impl SurfaceError {
    /// Whether the caller can simply try again on the next frame.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            SurfaceError::AcquisitionFailed { .. }
                | SurfaceError::WrapFailed { .. }
                | SurfaceError::PresentFailed { .. }
        )
    }
}

/// Convenience alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, SurfaceError>;

/// Errors that can occur while loading a [SurfaceConfig](crate::SurfaceConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read surface config {path:?}: {source}")]
    Read {
        /// The path that failed.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for this schema.
    #[error("Failed to parse surface config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but makes no sense.
    #[error("Invalid surface config value for `{key}`: {details}")]
    Invalid {
        /// The offending key.
        key: &'static str,
        /// What is wrong with it.
        details: String,
    },
}
