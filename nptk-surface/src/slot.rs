// SPDX-License-Identifier: LGPL-3.0-only

//! Fixed-capacity table of buffer slots.

use std::ops::{Index, IndexMut};

use crate::fence::Fence;
use crate::window::{BufferId, NativeBuffer};

/// Bookkeeping for one window buffer: its drawable surface and sync state.
///
/// A slot is *active* while it holds a buffer. It is *dequeued* between a
/// successful dequeue and the matching present or cancel; only then may it
/// hold a fence.
pub struct BufferSlot<B, S> {
    surface: Option<S>,
    buffer: Option<B>,
    dequeue_fence: Option<Fence>,
    dequeued: bool,
    last_presented: u64,
    has_valid_contents: bool,
    epoch: u64,
}

impl<B, S> BufferSlot<B, S> {
    fn empty() -> Self {
        Self {
            surface: None,
            buffer: None,
            dequeue_fence: None,
            dequeued: false,
            last_presented: 0,
            has_valid_contents: false,
            epoch: 0,
        }
    }

    /// The drawable surface wrapping this slot's buffer.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Mutable access to the drawable surface, for issuing draw commands.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// The window buffer held by this slot.
    pub fn buffer(&self) -> Option<&B> {
        self.buffer.as_ref()
    }

    /// Whether the slot holds a buffer.
    pub fn is_active(&self) -> bool {
        self.buffer.is_some()
    }

    /// Whether the buffer is currently dequeued.
    pub fn is_dequeued(&self) -> bool {
        self.dequeued
    }

    /// Whether the slot still owns the fence it was dequeued with.
    pub fn holds_fence(&self) -> bool {
        self.dequeue_fence.is_some()
    }

    /// The dequeue fence, if still owned.
    pub fn dequeue_fence(&self) -> Option<&Fence> {
        self.dequeue_fence.as_ref()
    }

    /// Hand the dequeue fence to the GPU backend, which waits on it before drawing.
    pub fn take_dequeue_fence(&mut self) -> Option<Fence> {
        self.dequeue_fence.take()
    }

    /// Whether the pixels from the last present of this buffer are still intact.
    pub fn has_valid_contents(&self) -> bool {
        self.has_valid_contents
    }

    /// Present counter value recorded when this buffer was last presented.
    pub fn last_presented(&self) -> u64 {
        self.last_presented
    }

    /// Geometry epoch the surface was wrapped at.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn buffer_id(&self) -> Option<BufferId>
    where
        B: NativeBuffer,
    {
        self.buffer.as_ref().map(NativeBuffer::id)
    }

    /// Install a freshly wrapped buffer. Previous contents are unknown.
    pub(crate) fn install(&mut self, buffer: B, surface: S, epoch: u64) {
        self.surface = Some(surface);
        self.buffer = Some(buffer);
        self.has_valid_contents = false;
        self.last_presented = 0;
        self.epoch = epoch;
    }

    /// Swap in a new handle to the buffer this slot already wraps.
    pub(crate) fn refresh(&mut self, buffer: B) {
        self.buffer = Some(buffer);
    }

    pub(crate) fn mark_dequeued(&mut self, fence: Option<Fence>) {
        debug_assert!(!self.dequeued);
        self.dequeued = true;
        self.dequeue_fence = fence;
    }

    /// Leave the dequeued state, closing any fence still owned.
    pub(crate) fn mark_idle(&mut self) {
        self.dequeued = false;
        self.dequeue_fence = None;
    }

    pub(crate) fn mark_presented(&mut self, present_count: u64) {
        self.mark_idle();
        self.last_presented = present_count;
        self.has_valid_contents = true;
    }

    /// Split out everything the window must get back for a cancel.
    pub(crate) fn take_for_cancel(&mut self) -> (Option<&B>, Option<Fence>) {
        let fence = self.dequeue_fence.take();
        self.dequeued = false;
        (self.buffer.as_ref(), fence)
    }

    /// Drop the surface, then the buffer reference, and forget all state.
    pub(crate) fn reset(&mut self) {
        debug_assert!(!self.dequeued && self.dequeue_fence.is_none());
        self.surface = None;
        self.buffer = None;
        self.dequeue_fence = None;
        self.dequeued = false;
        self.last_presented = 0;
        self.has_valid_contents = false;
        self.epoch = 0;
    }
}

/// The slot array for one window, sized once at construction.
pub struct SlotTable<B, S> {
    slots: Box<[BufferSlot<B, S>]>,
}

impl<B: NativeBuffer, S> SlotTable<B, S> {
    /// Create `capacity` inactive slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| BufferSlot::empty()).collect(),
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over all slots, active or not.
    pub fn iter(&self) -> impl Iterator<Item = &BufferSlot<B, S>> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut BufferSlot<B, S>> {
        self.slots.iter_mut()
    }

    /// Index of the slot already holding buffer `id`.
    pub fn find(&self, id: BufferId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.buffer_id() == Some(id))
    }

    /// Index of the first inactive slot.
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(|slot| !slot.is_active())
    }

    /// The idle slot whose contents are least useful: never presented first,
    /// then the one presented longest ago.
    pub fn least_recently_presented(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_dequeued())
            .min_by_key(|(_, slot)| (slot.has_valid_contents(), slot.last_presented()))
            .map(|(index, _)| index)
    }

    /// Where a newly dequeued buffer `id` goes: its own slot, a free one, or an evicted one.
    pub fn slot_for(&self, id: BufferId) -> Option<usize> {
        self.find(id)
            .or_else(|| self.first_free())
            .or_else(|| self.least_recently_presented())
    }

    /// Number of slots currently dequeued.
    pub fn dequeued_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_dequeued()).count()
    }

    /// Number of fences owned by slots.
    pub fn owned_fence_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.holds_fence()).count()
    }

    /// Number of slots holding a buffer.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_active()).count()
    }

    /// The slot at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&BufferSlot<B, S>> {
        self.slots.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut BufferSlot<B, S>> {
        self.slots.get_mut(index)
    }
}

impl<B, S> Index<usize> for SlotTable<B, S> {
    type Output = BufferSlot<B, S>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.slots[index]
    }
}

impl<B, S> IndexMut<usize> for SlotTable<B, S> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.slots[index]
    }
}
