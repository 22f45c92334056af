// SPDX-License-Identifier: LGPL-3.0-only

//! Boundary with the windowing system that owns the buffer queue.

use crate::color::{Dataspace, PixelFormat};
use crate::fence::Fence;
use crate::geometry::{PixelRect, PixelSize, Transform};
use crate::usage::BufferUsage;

/// Identity of a physical window buffer.
///
/// Two handles with the same id refer to the same allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// A buffer allocated by the windowing system.
///
/// Holding a value keeps a reference to the allocation; dropping it releases
/// that reference.
pub trait NativeBuffer {
    /// Identity of the underlying allocation.
    fn id(&self) -> BufferId;

    /// Physical dimensions of the buffer.
    fn size(&self) -> PixelSize;
}

/// Static properties of a window, queried once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMetrics {
    /// Current size of the window.
    pub default_size: PixelSize,
    /// Smallest buffer size the window accepts.
    pub min_size: PixelSize,
    /// Largest buffer size the window accepts.
    pub max_size: PixelSize,
    /// Transform the compositor will apply to the window's content.
    pub transform_hint: Transform,
    /// Buffers the consumer keeps for itself at all times.
    pub min_undequeued_buffers: usize,
    /// Largest buffer count the queue supports.
    pub max_buffer_count: usize,
}

/// Buffer settings pushed to the window.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferConfig {
    /// Physical buffer size.
    pub size: PixelSize,
    /// Pixel format.
    pub format: PixelFormat,
    /// Dataspace the content is encoded in.
    pub dataspace: Dataspace,
    /// Usage flags for allocation.
    pub usage: BufferUsage,
    /// Number of buffers in the queue.
    pub buffer_count: usize,
    /// Transform the compositor applies to queued buffers.
    pub transform: Transform,
}

/// A compositor-owned window with a queue of buffers.
///
/// Ownership rules:
/// * [dequeue_buffer](NativeWindow::dequeue_buffer) hands the buffer reference
///   and its fence to the caller.
/// * [queue_buffer](NativeWindow::queue_buffer) and
///   [cancel_buffer](NativeWindow::cancel_buffer) always take the fence, even
///   when they fail.
pub trait NativeWindow {
    /// Handle to one of the window's buffers.
    type Buffer: NativeBuffer;
    /// Error reported by the window.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Query size bounds, transform hint and queue depth.
    fn query(&self) -> Result<WindowMetrics, Self::Error>;

    /// Current transform hint. May change at runtime (e.g. display rotation).
    fn transform_hint(&self) -> Result<Transform, Self::Error>;

    /// Apply size, format, dataspace, usage, buffer count and transform.
    fn configure(&mut self, config: &BufferConfig) -> Result<(), Self::Error>;

    /// Take the next free buffer.
    ///
    /// # Returns
    /// * `Ok((buffer, fence))` where `fence` signals once the previous contents
    ///   may be overwritten; `None` means the buffer is ready now
    /// * `Err(_)` if no buffer could be supplied
    fn dequeue_buffer(&mut self) -> Result<(Self::Buffer, Option<Fence>), Self::Error>;

    /// Hand a drawn buffer to the compositor.
    ///
    /// `fence` signals when rendering into the buffer has finished. `damage`
    /// restricts the changed region; `None` means the whole buffer.
    fn queue_buffer(
        &mut self,
        buffer: &Self::Buffer,
        fence: Option<Fence>,
        damage: Option<PixelRect>,
    ) -> Result<(), Self::Error>;

    /// Return a dequeued buffer without presenting it.
    fn cancel_buffer(&mut self, buffer: &Self::Buffer, fence: Option<Fence>)
        -> Result<(), Self::Error>;
}
