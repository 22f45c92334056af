// SPDX-License-Identifier: LGPL-3.0-only

//! The per-window buffer pool.
//!
//! [SurfaceManager] owns the slot table of one native window. A frame goes
//! through two states:
//!
//! * **Idle**: no buffer dequeued. [dequeue_native_buffer](SurfaceManager::dequeue_native_buffer)
//!   moves to *Dequeued*.
//! * **Dequeued**: exactly one slot is current.
//!   [present_current_buffer](SurfaceManager::present_current_buffer) or
//!   [cancel_current_buffer](SurfaceManager::cancel_current_buffer) move back to *Idle*.
//!
//! The manager is single-threaded: all calls for one window must come from the
//! same render thread. It never waits on fences; the GPU backend does.

use vello::kurbo::{Affine, Rect};

use crate::color::{resolve_dataspace, ColorMode, ColorSpace, ColorType};
use crate::config::SurfaceConfig;
use crate::error::{BoxError, Result, SurfaceError};
use crate::fence::Fence;
use crate::geometry::{compute_window_size_and_transform, PixelRect, PixelSize, WindowInfo};
use crate::gpu::{GpuContext, SurfaceDescriptor};
use crate::slot::{BufferSlot, SlotTable};
use crate::usage::BufferUsage;
use crate::window::{BufferConfig, BufferId, NativeBuffer, NativeWindow};

/// Smallest size a window may be resolved to.
const MIN_WINDOW_SIZE: PixelSize = PixelSize::new(1, 1);

/// Manages the buffers of one native window for one GPU context.
pub struct SurfaceManager<W, G>
where
    W: NativeWindow,
    G: GpuContext<W::Buffer>,
{
    window: W,
    gpu: G,
    info: WindowInfo,
    color_type: ColorType,
    color_space: ColorSpace,
    slots: SlotTable<W::Buffer, G::Surface>,
    current: Option<usize>,
    present_count: u64,
    /// Bumped whenever geometry changes; slots wrapped at an older epoch are re-wrapped.
    epoch: u64,
    min_size: PixelSize,
    max_size: PixelSize,
    /// Hard limit for buffers the window hands out at runtime.
    gpu_max_size: PixelSize,
}

impl<W, G> SurfaceManager<W, G>
where
    W: NativeWindow,
    G: GpuContext<W::Buffer>,
{
    /// Configure `window` for rendering with `gpu` and take ownership of both.
    ///
    /// # Returns
    /// * `Ok(SurfaceManager)` once the window accepted the configuration
    /// * `Err(SurfaceError)` if the color setup is unsupported, the geometry is
    ///   degenerate, or the window rejected the configuration
    pub fn create(
        mut window: W,
        color_mode: ColorMode,
        color_type: ColorType,
        color_space: ColorSpace,
        gpu: G,
        config: &SurfaceConfig,
    ) -> Result<Self> {
        let metrics = window
            .query()
            .map_err(|e| SurfaceError::QueryFailed { source: Box::new(e) })?;

        let dataspace = resolve_dataspace(color_mode, color_type, color_space).ok_or(
            SurfaceError::UnsupportedColor {
                mode: color_mode,
                color_type,
                color_space,
            },
        )?;
        let pixel_format = color_type.pixel_format();

        let usage = BufferUsage::RENDER_TARGET;
        if !gpu.supported_usage(pixel_format).contains(usage) {
            return Err(SurfaceError::UnsupportedUsage {
                format: pixel_format,
                required: usage,
            });
        }

        let gpu_max = gpu.max_dimension();
        let gpu_max_size = PixelSize::new(gpu_max, gpu_max);
        let min_size = PixelSize::new(
            metrics.min_size.width.max(MIN_WINDOW_SIZE.width),
            metrics.min_size.height.max(MIN_WINDOW_SIZE.height),
        );
        let max_size = PixelSize::new(
            metrics.max_size.width.min(gpu_max),
            metrics.max_size.height.min(gpu_max),
        );

        let requested = metrics.min_undequeued_buffers
            + config.target_buffer_count
            + config.extra_buffers;
        let buffer_count = requested.min(metrics.max_buffer_count).max(1);
        if buffer_count < requested {
            log::warn!(
                "Window supports at most {} buffers, {} requested",
                metrics.max_buffer_count,
                requested
            );
        }

        let mut info = WindowInfo {
            size: metrics.default_size,
            pixel_format,
            dataspace,
            transform: metrics.transform_hint,
            buffer_count,
            usage,
            actual_size: PixelSize::default(),
            pre_transform: Affine::IDENTITY,
        };
        compute_window_size_and_transform(&mut info, min_size, max_size);
        if info.actual_size.is_empty() {
            return Err(SurfaceError::DegenerateSize { size: info.size });
        }

        update_window(&mut window, &info)?;

        log::debug!(
            "Created surface: {} (actual {}), transform {:?}, {:?}/{:?}, {} buffers",
            info.size,
            info.actual_size,
            info.transform,
            info.pixel_format,
            info.dataspace,
            info.buffer_count
        );

        Ok(Self {
            window,
            gpu,
            slots: SlotTable::new(buffer_count),
            info,
            color_type,
            color_space,
            current: None,
            present_count: 0,
            epoch: 0,
            min_size,
            max_size,
            gpu_max_size,
        })
    }

    /// Acquire the next buffer from the window and make it current.
    ///
    /// A changed transform hint is applied first: the logical size is kept,
    /// the actual size and pre-transform are recomputed and pushed to the
    /// window. If the window rejects that, no buffer is dequeued.
    ///
    /// On any later failure nothing in the slot table changes and the buffer
    /// obtained from the window is canceled back to it together with its fence.
    ///
    /// Calling this while a buffer is already dequeued is a caller error and
    /// yields [SurfaceError::BufferDequeued] without touching the window.
    pub fn dequeue_native_buffer(&mut self) -> Result<&mut BufferSlot<W::Buffer, G::Surface>> {
        if let Some(buffer) = self.current_buffer_id() {
            log::error!("dequeue requested while buffer {:?} is still dequeued", buffer);
            return Err(SurfaceError::BufferDequeued { buffer });
        }

        self.apply_transform_hint()?;

        let (buffer, fence) = self.window.dequeue_buffer().map_err(|e| {
            log::error!("dequeueBuffer failed: {}", e);
            SurfaceError::AcquisitionFailed { source: Box::new(e) }
        })?;
        let id = buffer.id();
        log::trace!("dequeued buffer {:?} ({}) fence {:?}", id, buffer.size(), fence);

        // Until committed below, every early return must give `buffer` and
        // `fence` back to the window.
        let resized = match self.plan_resize(&buffer) {
            Ok(resized) => resized,
            Err(source) => {
                self.return_to_window(&buffer, fence);
                return Err(SurfaceError::AcquisitionFailed { source });
            },
        };
        let epoch = if resized.is_some() { self.epoch + 1 } else { self.epoch };
        let actual_size = resized.as_ref().map_or(self.info.actual_size, |info| info.actual_size);

        let index = if resized.is_some() {
            // Every slot belongs to the old allocation and is released on commit.
            Some(0)
        } else {
            self.slots.slot_for(id)
        };
        let Some(index) = index.filter(|&i| i < self.slots.capacity()) else {
            self.return_to_window(&buffer, fence);
            return Err(SurfaceError::AcquisitionFailed {
                source: format!("no slot available for buffer {:?}", id).into(),
            });
        };

        let slot = &self.slots[index];
        let reusable = resized.is_none()
            && slot.buffer_id() == Some(id)
            && slot.surface().is_some()
            && slot.epoch() == epoch;

        let surface = if reusable {
            None
        } else {
            let descriptor = self.descriptor(actual_size);
            match self.gpu.wrap_buffer(&buffer, &descriptor) {
                Ok(surface) => Some(surface),
                Err(err) => {
                    log::error!("Failed to wrap buffer {:?}: {}", id, err);
                    self.return_to_window(&buffer, fence);
                    return Err(SurfaceError::WrapFailed {
                        buffer: id,
                        size: descriptor.size,
                        source: Box::new(err),
                    });
                },
            }
        };

        // Commit.
        if let Some(info) = resized {
            log::debug!(
                "Window buffers resized: {} (actual {}) -> {} (actual {})",
                self.info.size,
                self.info.actual_size,
                info.size,
                info.actual_size
            );
            self.info = info;
            self.epoch = epoch;
            self.release_idle_slots();
        }

        let slot = &mut self.slots[index];
        match surface {
            Some(surface) => {
                log::debug!("Wrapped buffer {:?} into slot {} at {}", id, index, self.info.actual_size);
                slot.install(buffer, surface, epoch);
            },
            None => slot.refresh(buffer),
        }
        slot.mark_dequeued(fence);
        self.current = Some(index);
        Ok(slot)
    }

    /// Queue the current buffer to the window.
    ///
    /// `completion` signals when the GPU has finished drawing; without one a
    /// duplicate of the buffer's dequeue fence is forwarded instead, so the
    /// slot still owns its fence if queueing fails. The window takes the
    /// forwarded fence whether or not queueing succeeds. `dirty` is in actual-size pixels; it
    /// is rounded out and clipped, and `None` damages the whole buffer.
    ///
    /// On failure the buffer stays dequeued so the caller can retry or cancel.
    pub fn present_current_buffer(
        &mut self,
        dirty: Option<Rect>,
        completion: Option<Fence>,
    ) -> Result<()> {
        let Some(index) = self.current else {
            return Err(SurfaceError::NoCurrentBuffer);
        };
        let damage = dirty.and_then(|rect| PixelRect::clipped(rect, self.info.actual_size));

        let slot = &mut self.slots[index];
        let Some(buffer) = slot.buffer() else {
            return Err(SurfaceError::NoCurrentBuffer);
        };
        let id = buffer.id();
        let fence = match completion {
            Some(fence) => Some(fence),
            None => slot
                .dequeue_fence()
                .map(Fence::try_clone)
                .transpose()
                .map_err(|e| {
                    log::error!("Failed to duplicate dequeue fence of {:?}: {}", id, e);
                    SurfaceError::PresentFailed {
                        buffer: id,
                        source: Box::new(e),
                    }
                })?,
        };

        if let Err(err) = self.window.queue_buffer(buffer, fence, damage) {
            log::error!("queueBuffer failed for {:?}: {}", id, err);
            return Err(SurfaceError::PresentFailed {
                buffer: id,
                source: Box::new(err),
            });
        }

        self.present_count += 1;
        slot.mark_presented(self.present_count);
        self.current = None;
        log::trace!("presented buffer {:?} as frame {}", id, self.present_count);
        Ok(())
    }

    /// Give the current buffer back to the window without presenting it.
    ///
    /// The slot returns to idle even if the window reports an error, since the
    /// window has taken the fence either way.
    pub fn cancel_current_buffer(&mut self) -> Result<()> {
        let Some(index) = self.current.take() else {
            return Err(SurfaceError::NoCurrentBuffer);
        };
        let slot = &mut self.slots[index];
        let (buffer, fence) = slot.take_for_cancel();
        let Some(buffer) = buffer else {
            return Ok(());
        };
        let id = buffer.id();
        self.window.cancel_buffer(buffer, fence).map_err(|e| {
            log::warn!("cancelBuffer failed for {:?}: {}", id, e);
            SurfaceError::CancelFailed {
                buffer: id,
                source: Box::new(e),
            }
        })
    }

    /// Change the logical size and reconfigure the window.
    ///
    /// All cached surfaces are released; buffers are re-wrapped lazily on dequeue.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if let Some(buffer) = self.current_buffer_id() {
            return Err(SurfaceError::BufferDequeued { buffer });
        }

        let mut info = self.info.clone();
        info.size = PixelSize::new(width, height);
        compute_window_size_and_transform(&mut info, self.min_size, self.max_size);
        if info.actual_size.is_empty() {
            return Err(SurfaceError::DegenerateSize { size: info.size });
        }
        update_window(&mut self.window, &info)?;

        log::debug!("Resized surface to {} (actual {})", info.size, info.actual_size);
        self.info = info;
        self.epoch += 1;
        self.release_idle_slots();
        Ok(())
    }

    /// Return every buffer to the window and drop all surfaces.
    ///
    /// A dequeued buffer is canceled with its fence. Safe to call repeatedly.
    pub fn release_buffers(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.is_dequeued() {
                let (buffer, fence) = slot.take_for_cancel();
                if let Some(buffer) = buffer {
                    if let Err(err) = self.window.cancel_buffer(buffer, fence) {
                        log::warn!("cancelBuffer failed during release: {}", err);
                    }
                }
            }
            slot.reset();
        }
        self.current = None;
    }

    /// The slot currently dequeued, if any.
    pub fn current_buffer(&self) -> Option<&BufferSlot<W::Buffer, G::Surface>> {
        self.current.map(|index| &self.slots[index])
    }

    /// Mutable access to the current slot, e.g. to take its fence for the GPU.
    pub fn current_buffer_mut(&mut self) -> Option<&mut BufferSlot<W::Buffer, G::Surface>> {
        let index = self.current?;
        self.slots.get_mut(index)
    }

    /// The drawable surface of the current buffer.
    pub fn current_surface(&self) -> Option<&G::Surface> {
        self.current_buffer().and_then(BufferSlot::surface)
    }

    /// Age of the current buffer. See [slot_buffer_age](Self::slot_buffer_age).
    pub fn current_buffer_age(&self) -> Option<u64> {
        self.current.and_then(|index| self.slot_buffer_age(index))
    }

    /// Presents since slot `index` was last shown.
    ///
    /// `None` when the slot's contents are unknown and must be fully redrawn.
    pub fn slot_buffer_age(&self, index: usize) -> Option<u64> {
        let slot = self.slots.get(index)?;
        if slot.is_active() && slot.has_valid_contents() {
            Some(self.present_count - slot.last_presented())
        } else {
            None
        }
    }

    /// Map a logical-space rect into the actual-size pixel space used for damage.
    pub fn map_logical_rect(&self, rect: Rect) -> Rect {
        self.info.map_logical_rect(rect)
    }

    /// Matrix to apply to logical drawing so it appears upright after compositing.
    pub fn pre_transform(&self) -> Affine {
        self.info.pre_transform
    }

    /// Width the renderer draws at.
    pub fn logical_width(&self) -> u32 {
        self.info.size.width
    }

    /// Height the renderer draws at.
    pub fn logical_height(&self) -> u32 {
        self.info.size.height
    }

    /// Current window geometry and format.
    pub fn window_info(&self) -> &WindowInfo {
        &self.info
    }

    /// The slot table.
    pub fn slots(&self) -> &SlotTable<W::Buffer, G::Surface> {
        &self.slots
    }

    /// Number of successful presents so far.
    pub fn present_count(&self) -> u64 {
        self.present_count
    }

    /// Number of dequeued slots (0 or 1).
    pub fn dequeued_count(&self) -> usize {
        self.slots.dequeued_count()
    }

    /// Number of fences currently owned by the manager.
    pub fn owned_fence_count(&self) -> usize {
        self.slots.owned_fence_count()
    }

    /// Number of slots holding a buffer.
    pub fn active_slot_count(&self) -> usize {
        self.slots.active_count()
    }

    /// The window this manager presents to.
    pub fn window(&self) -> &W {
        &self.window
    }

    fn current_buffer_id(&self) -> Option<BufferId> {
        self.current.and_then(|index| self.slots[index].buffer_id())
    }

    fn descriptor(&self, size: PixelSize) -> SurfaceDescriptor {
        SurfaceDescriptor {
            size,
            color_type: self.color_type,
            color_space: self.color_space,
            texture_format: self.color_type.texture_format(),
            usage: self.info.usage,
        }
    }

    /// Apply a changed transform hint to the window before the next dequeue.
    ///
    /// The logical size stays; actual size and pre-transform follow the new
    /// transform. Nothing is committed if the window rejects the configuration.
    fn apply_transform_hint(&mut self) -> Result<()> {
        let hint = match self.window.transform_hint() {
            Ok(hint) => hint,
            Err(err) => {
                log::warn!("Failed to query transform hint, keeping {:?}: {}", self.info.transform, err);
                return Ok(());
            },
        };
        if hint == self.info.transform {
            return Ok(());
        }

        let mut info = self.info.clone();
        info.transform = hint;
        compute_window_size_and_transform(&mut info, self.min_size, self.max_size);
        update_window(&mut self.window, &info)?;

        log::debug!(
            "Transform hint changed: {:?} (actual {}) -> {:?} (actual {})",
            self.info.transform,
            self.info.actual_size,
            info.transform,
            info.actual_size
        );
        let reallocated = info.actual_size != self.info.actual_size;
        self.info = info;
        self.epoch += 1;
        if reallocated {
            self.release_idle_slots();
        }
        Ok(())
    }

    /// Geometry for a dequeued buffer whose size differs from the actual size.
    ///
    /// Returns `None` when the buffer matches the current geometry. The logical
    /// size is re-derived from the buffer under the current transform.
    fn plan_resize(&self, buffer: &W::Buffer) -> std::result::Result<Option<WindowInfo>, BoxError> {
        let buffer_size = buffer.size();
        if buffer_size == self.info.actual_size {
            return Ok(None);
        }

        let mut info = self.info.clone();
        info.size = if info.transform.swaps_dimensions() {
            buffer_size.swapped()
        } else {
            buffer_size
        };
        compute_window_size_and_transform(&mut info, MIN_WINDOW_SIZE, self.gpu_max_size);
        if info.actual_size != buffer_size {
            return Err(format!(
                "buffer {:?} has size {} outside of the supported range",
                buffer.id(),
                buffer_size
            )
            .into());
        }
        Ok(Some(info))
    }

    fn return_to_window(&mut self, buffer: &W::Buffer, fence: Option<Fence>) {
        if let Err(err) = self.window.cancel_buffer(buffer, fence) {
            log::warn!("cancelBuffer failed for {:?}: {}", buffer.id(), err);
        }
    }

    /// Drop every idle slot. Only called while nothing is dequeued.
    fn release_idle_slots(&mut self) {
        for slot in self.slots.iter_mut() {
            if !slot.is_dequeued() {
                slot.reset();
            }
        }
    }
}

impl<W, G> Drop for SurfaceManager<W, G>
where
    W: NativeWindow,
    G: GpuContext<W::Buffer>,
{
    fn drop(&mut self) {
        self.release_buffers();
    }
}

/// Push `info` to the window: size, format, dataspace, usage, buffer count and transform.
///
/// The window is told the inverse of the transform hint so buffers arrive
/// pre-rotated by the renderer.
pub fn update_window<W: NativeWindow>(window: &mut W, info: &WindowInfo) -> Result<()> {
    let config = BufferConfig {
        size: info.actual_size,
        format: info.pixel_format,
        dataspace: info.dataspace,
        usage: info.usage,
        buffer_count: info.buffer_count,
        transform: info.transform.inverse(),
    };
    window.configure(&config).map_err(|e| {
        log::error!("Window rejected {:?}: {}", config, e);
        SurfaceError::ConfigurationRejected { source: Box::new(e) }
    })
}
