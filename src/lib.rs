#![warn(missing_docs)]

//! Present GPU-rendered frames to compositor-owned native windows.

pub use nptk_surface as surface;
pub use vello::kurbo as math;

/// A "prelude" for renderers presenting through nptk.
///
/// ```rust
/// use nptk_present::prelude::*;
/// ```
pub mod prelude {
    pub use crate::surface::{
        BufferSlot, ColorMode, ColorSpace, ColorType, Fence, GpuContext, NativeBuffer,
        NativeWindow, PixelSize, SurfaceConfig, SurfaceError, SurfaceManager, Transform,
        WindowInfo,
    };

    // Math
    pub use vello::kurbo::{Affine, Rect};
}
