// SPDX-License-Identifier: LGPL-3.0-only

//! Boundary with the GPU backend that turns window buffers into drawable surfaces.

use vello::wgpu::TextureFormat;

use crate::color::{ColorSpace, ColorType, PixelFormat};
use crate::geometry::PixelSize;
use crate::usage::BufferUsage;

/// Parameters for wrapping a window buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDescriptor {
    /// Size to wrap the buffer at (the window's actual size).
    pub size: PixelSize,
    /// Pixel layout the renderer uses.
    pub color_type: ColorType,
    /// Color space the renderer draws in.
    pub color_space: ColorSpace,
    /// GPU texture format matching `color_type`, if any.
    pub texture_format: Option<TextureFormat>,
    /// Usage the buffer was allocated with.
    pub usage: BufferUsage,
}

/// A GPU context able to render into window buffers of type `B`.
pub trait GpuContext<B> {
    /// Drawable surface wrapping one buffer. Dropping it releases the GPU resources.
    type Surface;
    /// Error reported by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Largest width/height of a 2D image the device supports.
    fn max_dimension(&self) -> u32;

    /// Buffer usages the device can handle for buffers of `format`.
    fn supported_usage(&self, format: PixelFormat) -> BufferUsage;

    /// Wrap `buffer` so draw commands can target it.
    fn wrap_buffer(
        &mut self,
        buffer: &B,
        descriptor: &SurfaceDescriptor,
    ) -> Result<Self::Surface, Self::Error>;
}
