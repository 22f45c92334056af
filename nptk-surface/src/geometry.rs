// SPDX-License-Identifier: LGPL-3.0-only

//! Window geometry: logical vs. physical buffer size and the compositor transform.
//!
//! The renderer always draws in *logical* coordinates. When the compositor
//! rotates the output by 90° or 270°, the physical buffers are allocated with
//! width and height swapped, and the renderer applies a *pre-transform* so the
//! content lands upright once the compositor applies its own transform.

use std::fmt;

use bitflags::bitflags;
use vello::kurbo::{Affine, Rect};

use crate::color::{Dataspace, PixelFormat};
use crate::usage::BufferUsage;

/// An integer size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The same size with width and height exchanged.
    pub const fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Whether either dimension is zero.
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clamp each dimension into `[min, max]`. `max` wins if the bounds cross.
    pub fn clamp(self, min: PixelSize, max: PixelSize) -> Self {
        Self {
            width: self.width.max(min.width).min(max.width),
            height: self.height.max(min.height).min(max.height),
        }
    }

    /// The full-size rectangle anchored at the origin.
    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An integer rectangle in physical buffer pixels, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Round `rect` outwards to whole pixels and clip it to `bounds`.
    ///
    /// Returns `None` when nothing of the rect is left.
    pub fn clipped(rect: Rect, bounds: PixelSize) -> Option<Self> {
        let rect = rect.abs().expand().intersect(bounds.to_rect());
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return None;
        }
        Some(Self {
            x: rect.x0 as u32,
            y: rect.y0 as u32,
            width: rect.width() as u32,
            height: rect.height() as u32,
        })
    }
}

bitflags! {
    /// Rotation/flip applied by the compositor to a window's buffers.
    ///
    /// Flips are applied first, then the 90° rotation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Transform: u32 {
        /// Mirror horizontally.
        const FLIP_H = 0x01;
        /// Mirror vertically.
        const FLIP_V = 0x02;
        /// Rotate 90° clockwise.
        const ROT_90 = 0x04;
        /// Rotate 180°.
        const ROT_180 = Self::FLIP_H.bits() | Self::FLIP_V.bits();
        /// Rotate 270° clockwise.
        const ROT_270 = Self::ROT_180.bits() | Self::ROT_90.bits();
    }
}

impl Transform {
    /// Whether this transform exchanges width and height.
    pub fn swaps_dimensions(self) -> bool {
        self.contains(Transform::ROT_90)
    }

    /// The transform that undoes this one.
    ///
    /// Pure rotations invert (90 ↔ 270); reflections are their own inverse.
    pub fn inverse(self) -> Self {
        if self == Transform::ROT_90 {
            Transform::ROT_270
        } else if self == Transform::ROT_270 {
            Transform::ROT_90
        } else {
            self
        }
    }

    /// Matrix mapping logical coordinates of a `size` window into the physical buffer.
    pub fn pre_transform(self, size: PixelSize) -> Affine {
        let w = size.width as f64;
        let h = size.height as f64;
        let coeffs = match self.bits() & Transform::all().bits() {
            0 => return Affine::IDENTITY,
            // (w - x, y)
            0x01 => [-1.0, 0.0, 0.0, 1.0, w, 0.0],
            // (x, h - y)
            0x02 => [1.0, 0.0, 0.0, -1.0, 0.0, h],
            // (w - x, h - y)
            0x03 => [-1.0, 0.0, 0.0, -1.0, w, h],
            // (h - y, x)
            0x04 => [0.0, 1.0, -1.0, 0.0, h, 0.0],
            // (h - y, w - x)
            0x05 => [0.0, -1.0, -1.0, 0.0, h, w],
            // (y, x)
            0x06 => [0.0, 1.0, 1.0, 0.0, 0.0, 0.0],
            // (y, w - x)
            _ => [0.0, -1.0, 1.0, 0.0, 0.0, w],
        };
        Affine::new(coeffs)
    }
}

/// Geometry and buffer format of the window being presented to.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    /// Logical size the renderer draws at.
    pub size: PixelSize,
    /// Pixel format of the window's buffers.
    pub pixel_format: PixelFormat,
    /// Dataspace the buffers are interpreted in.
    pub dataspace: Dataspace,
    /// Compositor transform (the window's transform hint).
    pub transform: Transform,
    /// Number of buffers requested from the window.
    pub buffer_count: usize,
    /// Usage flags requested for the buffers.
    pub usage: BufferUsage,
    /// Physical size of the buffers; `size` swapped when the transform rotates by 90°.
    pub actual_size: PixelSize,
    /// Matrix the renderer applies so logical content lands upright after compositing.
    pub pre_transform: Affine,
}

impl WindowInfo {
    /// Map a rect given in logical coordinates into physical buffer pixels.
    pub fn map_logical_rect(&self, rect: Rect) -> Rect {
        self.pre_transform.transform_rect_bbox(rect)
    }
}

/// Clamp the logical size and derive the actual size and pre-transform.
///
/// Pure and idempotent: only `size` and `transform` are read.
pub fn compute_window_size_and_transform(
    info: &mut WindowInfo,
    min_size: PixelSize,
    max_size: PixelSize,
) {
    let clamped = info.size.clamp(min_size, max_size);
    if clamped != info.size {
        log::warn!(
            "Window size {} clamped to {} (bounds {} .. {})",
            info.size,
            clamped,
            min_size,
            max_size
        );
    }
    info.size = clamped;
    info.actual_size = if info.transform.swaps_dimensions() {
        clamped.swapped()
    } else {
        clamped
    };
    info.pre_transform = info.transform.pre_transform(clamped);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vello::kurbo::Point;

    fn info(width: u32, height: u32, transform: Transform) -> WindowInfo {
        WindowInfo {
            size: PixelSize::new(width, height),
            pixel_format: PixelFormat::Rgba8888,
            dataspace: Dataspace::Srgb,
            transform,
            buffer_count: 3,
            usage: BufferUsage::GPU_COLOR_OUTPUT,
            actual_size: PixelSize::default(),
            pre_transform: Affine::IDENTITY,
        }
    }

    const MIN: PixelSize = PixelSize::new(1, 1);
    const MAX: PixelSize = PixelSize::new(4096, 4096);

    #[test]
    fn test_rot90_swaps_actual_size() {
        let mut info = info(1080, 1920, Transform::ROT_90);
        compute_window_size_and_transform(&mut info, MIN, MAX);
        assert_eq!(info.actual_size, PixelSize::new(1920, 1080));
        assert_ne!(info.pre_transform, Affine::IDENTITY);
    }

    #[test]
    fn test_swap_only_for_quarter_turns() {
        let all = [
            Transform::empty(),
            Transform::FLIP_H,
            Transform::FLIP_V,
            Transform::ROT_180,
            Transform::ROT_90,
            Transform::ROT_90 | Transform::FLIP_H,
            Transform::ROT_90 | Transform::FLIP_V,
            Transform::ROT_270,
        ];
        for transform in all {
            let mut info = info(300, 200, transform);
            compute_window_size_and_transform(&mut info, MIN, MAX);
            let expected = if transform.contains(Transform::ROT_90) {
                PixelSize::new(200, 300)
            } else {
                PixelSize::new(300, 200)
            };
            assert_eq!(info.actual_size, expected, "transform {:?}", transform);
        }
    }

    #[test]
    fn test_compute_is_idempotent() {
        for bits in 0..8 {
            let transform = Transform::from_bits_truncate(bits);
            let mut once = info(5000, 0, transform);
            compute_window_size_and_transform(&mut once, MIN, MAX);
            let mut twice = once.clone();
            compute_window_size_and_transform(&mut twice, MIN, MAX);
            assert_eq!(once.size, twice.size);
            assert_eq!(once.actual_size, twice.actual_size);
            let a = once.pre_transform.as_coeffs().map(f64::to_bits);
            let b = twice.pre_transform.as_coeffs().map(f64::to_bits);
            assert_eq!(a, b, "transform {:?}", transform);
        }
    }

    #[test]
    fn test_size_is_clamped_into_bounds() {
        let mut info = info(8000, 0, Transform::empty());
        compute_window_size_and_transform(&mut info, MIN, MAX);
        assert_eq!(info.size, PixelSize::new(4096, 1));
        assert_eq!(info.actual_size, PixelSize::new(4096, 1));
    }

    #[test]
    fn test_pre_transform_maps_logical_corners_into_buffer() {
        let size = PixelSize::new(1080, 1920);
        for bits in 0..8 {
            let transform = Transform::from_bits_truncate(bits);
            let actual = if transform.swaps_dimensions() {
                size.swapped()
            } else {
                size
            };
            let mapped = transform.pre_transform(size).transform_rect_bbox(size.to_rect());
            assert_eq!(mapped, actual.to_rect(), "transform {:?}", transform);
        }
    }

    #[test]
    fn test_rot90_pre_transform_maps_origin_to_top_right() {
        let m = Transform::ROT_90.pre_transform(PixelSize::new(100, 50));
        assert_eq!(m * Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        assert_eq!(m * Point::new(100.0, 0.0), Point::new(50.0, 100.0));
    }

    #[test]
    fn test_rot270_matches_composed_flips_and_rotation() {
        let size = PixelSize::new(640, 480);
        let composed = Transform::ROT_90.pre_transform(size) * Transform::ROT_180.pre_transform(size);
        assert_eq!(Transform::ROT_270.pre_transform(size), composed);
    }

    #[test]
    fn test_damage_rounds_out_and_clips() {
        let bounds = PixelSize::new(100, 50);
        let rect = PixelRect::clipped(Rect::new(10.2, 5.7, 120.0, 20.1), bounds);
        assert_eq!(
            rect,
            Some(PixelRect {
                x: 10,
                y: 5,
                width: 90,
                height: 16
            })
        );
        assert_eq!(PixelRect::clipped(Rect::new(200.0, 0.0, 300.0, 10.0), bounds), None);
        assert_eq!(PixelRect::clipped(Rect::ZERO, bounds), None);
    }

    #[test]
    fn test_inverse_round_trips() {
        for bits in 0..8 {
            let transform = Transform::from_bits_truncate(bits);
            assert_eq!(transform.inverse().inverse(), transform);
        }
        assert_eq!(Transform::ROT_90.inverse(), Transform::ROT_270);
        assert_eq!(Transform::ROT_180.inverse(), Transform::ROT_180);
        assert_eq!(
            (Transform::ROT_90 | Transform::FLIP_H).inverse(),
            Transform::ROT_90 | Transform::FLIP_H
        );
    }
}
