// SPDX-License-Identifier: LGPL-3.0-only

use bitflags::bitflags;

bitflags! {
    /// How the window's buffers will be accessed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u64 {
        /// CPU reads the buffer occasionally.
        const CPU_READ_RARELY = 1 << 1;
        /// CPU writes the buffer occasionally.
        const CPU_WRITE_RARELY = 1 << 5;
        /// GPU samples the buffer as a texture.
        const GPU_SAMPLED_IMAGE = 1 << 8;
        /// GPU renders into the buffer.
        const GPU_COLOR_OUTPUT = 1 << 9;
        /// The compositor may scan the buffer out as a hardware overlay.
        const COMPOSER_OVERLAY = 1 << 11;
        /// Contents must be kept out of unprotected memory.
        const PROTECTED_CONTENT = 1 << 14;
    }
}

impl BufferUsage {
    /// Usage every rendered window buffer needs.
    pub const RENDER_TARGET: Self = Self::GPU_COLOR_OUTPUT.union(Self::GPU_SAMPLED_IMAGE);
}
