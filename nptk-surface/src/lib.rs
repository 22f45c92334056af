#![warn(missing_docs)]

//! # NPTK Surface Management
//!
//! Buffer pool and geometry handling for presenting GPU-rendered frames to a
//! compositor-owned native window.
//!
//! ## Overview
//!
//! - **[SurfaceManager](manager::SurfaceManager)**: owns a window's buffer slots,
//!   runs the dequeue → draw → present cycle and tracks buffer age
//! - **[NativeWindow](window::NativeWindow)**: the window/buffer-queue boundary
//! - **[GpuContext](gpu::GpuContext)**: the backend that wraps window buffers into drawable surfaces
//! - **[Transform](geometry::Transform)**: compositor rotation/flip and the matching pre-transform
//! - **[SurfaceConfig](config::SurfaceConfig)**: buffer count tuning from TOML files and environment variables
//!
//! ## Frame Cycle
//!
//! ```rust,ignore
//! let mut manager = SurfaceManager::create(
//!     window,
//!     ColorMode::Default,
//!     ColorType::Rgba8888,
//!     ColorSpace::Srgb,
//!     gpu,
//!     &SurfaceConfig::default(),
//! )?;
//!
//! let pre_transform = manager.pre_transform();
//! let slot = manager.dequeue_native_buffer()?;
//! let wait = slot.take_dequeue_fence();
//! let done = renderer.draw(slot.surface_mut(), wait, pre_transform);
//! manager.present_current_buffer(None, done)?;
//! ```
//!
//! ## Fence Ownership
//!
//! Every [Fence](fence::Fence) is owned by exactly one party. A fence returned
//! by the window belongs to the dequeued slot until it is handed to the GPU,
//! to the window with a present, or back to the window with a cancel.

#[cfg(not(unix))]
compile_error!("nptk-surface exchanges fences as file descriptors and requires a unix target");

/// Color modes, pixel formats and dataspaces.
pub mod color;
/// Buffer pool configuration from TOML and the environment.
pub mod config;
pub mod error;
pub mod fence;
pub mod geometry;
pub mod gpu;
pub mod manager;
/// Per-buffer slot bookkeeping.
pub mod slot;
/// Buffer usage flags.
pub mod usage;
pub mod window;

pub use color::{ColorMode, ColorSpace, ColorType, Dataspace, PixelFormat};
pub use config::SurfaceConfig;
pub use error::{ConfigError, Result, SurfaceError};
pub use fence::Fence;
pub use geometry::{compute_window_size_and_transform, PixelRect, PixelSize, Transform, WindowInfo};
pub use gpu::{GpuContext, SurfaceDescriptor};
pub use manager::{update_window, SurfaceManager};
pub use slot::{BufferSlot, SlotTable};
pub use usage::BufferUsage;
pub use window::{BufferConfig, BufferId, NativeBuffer, NativeWindow, WindowMetrics};
