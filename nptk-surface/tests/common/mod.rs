// SPDX-License-Identifier: LGPL-3.0-only

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::File;
use std::os::fd::OwnedFd;
use std::rc::Rc;

use nptk_surface::{
    BufferConfig, BufferId, BufferUsage, ColorMode, ColorSpace, ColorType, Fence, GpuContext,
    NativeBuffer, NativeWindow, PixelFormat, PixelRect, PixelSize, SurfaceConfig,
    SurfaceDescriptor, SurfaceManager, Transform, WindowMetrics,
};

#[derive(Debug, thiserror::Error)]
#[error("mock failure: {0}")]
pub struct MockError(pub &'static str);

pub fn fence() -> Fence {
    Fence::from(OwnedFd::from(File::open("/dev/null").unwrap()))
}

#[derive(Debug)]
pub struct MockBuffer {
    pub id: BufferId,
    pub size: PixelSize,
}

impl NativeBuffer for MockBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn size(&self) -> PixelSize {
        self.size
    }
}

pub struct Queued {
    pub id: BufferId,
    pub fence: Option<Fence>,
    pub damage: Option<PixelRect>,
}

pub struct Canceled {
    pub id: BufferId,
    pub fence: Option<Fence>,
}

pub struct WindowState {
    pub metrics: WindowMetrics,
    pub hint: Transform,
    /// Size of newly handed out buffers; follows the last configuration.
    pub buffer_size: PixelSize,
    /// Bumped on every reallocation so buffer ids change with the allocation.
    pub generation: u64,
    pub buffer_count: usize,
    /// Hand out this many distinct buffers instead of the configured count.
    pub distinct_buffers: Option<usize>,
    pub next: usize,
    pub give_fences: bool,
    pub fail_query: bool,
    pub fail_hint: bool,
    pub fail_configure: bool,
    pub fail_dequeue: bool,
    pub fail_queue: bool,
    pub fail_cancel: bool,
    pub dequeue_calls: usize,
    pub outstanding: HashSet<BufferId>,
    pub configs: Vec<BufferConfig>,
    pub queued: Vec<Queued>,
    pub canceled: Vec<Canceled>,
}

impl WindowState {
    /// Simulate the compositor resizing the queue behind the renderer's back.
    pub fn reallocate(&mut self, size: PixelSize) {
        if !self.buffer_size.is_empty() {
            self.generation += 1;
        }
        self.buffer_size = size;
        self.next = 0;
    }
}

#[derive(Clone)]
pub struct MockWindow {
    pub state: Rc<RefCell<WindowState>>,
}

impl MockWindow {
    pub fn new(default_size: PixelSize, hint: Transform) -> Self {
        let metrics = WindowMetrics {
            default_size,
            min_size: PixelSize::new(1, 1),
            max_size: PixelSize::new(8192, 8192),
            transform_hint: hint,
            min_undequeued_buffers: 1,
            max_buffer_count: 8,
        };
        Self::with_metrics(metrics)
    }

    pub fn with_metrics(metrics: WindowMetrics) -> Self {
        let state = WindowState {
            hint: metrics.transform_hint,
            metrics,
            buffer_size: PixelSize::default(),
            generation: 0,
            buffer_count: 0,
            distinct_buffers: None,
            next: 0,
            give_fences: true,
            fail_query: false,
            fail_hint: false,
            fail_configure: false,
            fail_dequeue: false,
            fail_queue: false,
            fail_cancel: false,
            dequeue_calls: 0,
            outstanding: HashSet::new(),
            configs: Vec::new(),
            queued: Vec::new(),
            canceled: Vec::new(),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }
}

impl NativeWindow for MockWindow {
    type Buffer = MockBuffer;
    type Error = MockError;

    fn query(&self) -> Result<WindowMetrics, MockError> {
        let state = self.state.borrow();
        if state.fail_query {
            return Err(MockError("query"));
        }
        Ok(state.metrics)
    }

    fn transform_hint(&self) -> Result<Transform, MockError> {
        let state = self.state.borrow();
        if state.fail_hint {
            return Err(MockError("transform hint"));
        }
        Ok(state.hint)
    }

    fn configure(&mut self, config: &BufferConfig) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        if state.fail_configure {
            return Err(MockError("configure"));
        }
        if config.size != state.buffer_size {
            state.reallocate(config.size);
        }
        state.buffer_count = config.buffer_count;
        state.configs.push(config.clone());
        Ok(())
    }

    fn dequeue_buffer(&mut self) -> Result<(MockBuffer, Option<Fence>), MockError> {
        let mut state = self.state.borrow_mut();
        state.dequeue_calls += 1;
        if state.fail_dequeue {
            return Err(MockError("dequeue"));
        }
        let count = state.distinct_buffers.unwrap_or(state.buffer_count).max(1);
        let id = (0..count)
            .map(|offset| (state.next + offset) % count)
            .map(|index| BufferId((state.generation << 16) | index as u64))
            .find(|id| !state.outstanding.contains(id))
            .ok_or(MockError("all buffers dequeued"))?;
        state.next = (id.0 as usize & 0xffff) + 1;
        state.outstanding.insert(id);
        let buffer = MockBuffer {
            id,
            size: state.buffer_size,
        };
        let fence = state.give_fences.then(fence);
        Ok((buffer, fence))
    }

    fn queue_buffer(
        &mut self,
        buffer: &MockBuffer,
        fence: Option<Fence>,
        damage: Option<PixelRect>,
    ) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        if state.fail_queue {
            drop(fence);
            return Err(MockError("queue"));
        }
        state.outstanding.remove(&buffer.id);
        state.queued.push(Queued {
            id: buffer.id,
            fence,
            damage,
        });
        Ok(())
    }

    fn cancel_buffer(&mut self, buffer: &MockBuffer, fence: Option<Fence>) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.outstanding.remove(&buffer.id);
        if state.fail_cancel {
            drop(fence);
            return Err(MockError("cancel"));
        }
        state.canceled.push(Canceled {
            id: buffer.id,
            fence,
        });
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockSurface {
    pub buffer: BufferId,
    pub size: PixelSize,
}

pub struct GpuState {
    pub max_dimension: u32,
    pub usage: BufferUsage,
    pub fail_wrap: bool,
    pub wrapped: Vec<(BufferId, SurfaceDescriptor)>,
}

#[derive(Clone)]
pub struct MockGpu {
    pub state: Rc<RefCell<GpuState>>,
}

impl MockGpu {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(GpuState {
                max_dimension: 4096,
                usage: BufferUsage::RENDER_TARGET | BufferUsage::COMPOSER_OVERLAY,
                fail_wrap: false,
                wrapped: Vec::new(),
            })),
        }
    }
}

impl GpuContext<MockBuffer> for MockGpu {
    type Surface = MockSurface;
    type Error = MockError;

    fn max_dimension(&self) -> u32 {
        self.state.borrow().max_dimension
    }

    fn supported_usage(&self, _format: PixelFormat) -> BufferUsage {
        self.state.borrow().usage
    }

    fn wrap_buffer(
        &mut self,
        buffer: &MockBuffer,
        descriptor: &SurfaceDescriptor,
    ) -> Result<MockSurface, MockError> {
        let mut state = self.state.borrow_mut();
        if state.fail_wrap {
            return Err(MockError("wrap"));
        }
        state.wrapped.push((buffer.id, descriptor.clone()));
        Ok(MockSurface {
            buffer: buffer.id,
            size: descriptor.size,
        })
    }
}

pub type Manager = SurfaceManager<MockWindow, MockGpu>;

/// A manager on an sRGB 8888 window with the built-in buffer counts.
pub fn create(window: &MockWindow, gpu: &MockGpu) -> Manager {
    SurfaceManager::create(
        window.clone(),
        ColorMode::Default,
        ColorType::Rgba8888,
        ColorSpace::Srgb,
        gpu.clone(),
        &SurfaceConfig::baseline(),
    )
    .unwrap()
}

/// Dequeue and immediately present `frames` frames.
pub fn run_frames(manager: &mut Manager, frames: usize) {
    for _ in 0..frames {
        manager.dequeue_native_buffer().unwrap();
        manager.present_current_buffer(None, None).unwrap();
    }
}
