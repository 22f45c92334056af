// SPDX-License-Identifier: LGPL-3.0-only

//! Color configuration of a window's buffers.
//!
//! The renderer picks a [ColorType] and [ColorSpace]; these resolve to the
//! [PixelFormat] and [Dataspace] the window is configured with.

use vello::wgpu::TextureFormat;

/// Requested color gamut handling of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// sRGB-class output.
    #[default]
    Default,
    /// Wide color gamut output; requires a wide dataspace.
    WideColorGamut,
}

/// In-memory layout of a pixel as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    /// 8 bits per channel RGBA.
    Rgba8888,
    /// 16-bit float per channel RGBA.
    RgbaF16,
    /// 5/6/5 RGB.
    Rgb565,
    /// 10 bits per color channel, 2-bit alpha.
    Rgba1010102,
}

impl ColorType {
    /// Buffer pixel format for this color type.
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            ColorType::Rgba8888 => PixelFormat::Rgba8888,
            ColorType::RgbaF16 => PixelFormat::RgbaFp16,
            ColorType::Rgb565 => PixelFormat::Rgb565,
            ColorType::Rgba1010102 => PixelFormat::Rgba1010102,
        }
    }

    /// The matching GPU texture format, if the GPU API has one.
    pub fn texture_format(self) -> Option<TextureFormat> {
        match self {
            ColorType::Rgba8888 => Some(TextureFormat::Rgba8Unorm),
            ColorType::RgbaF16 => Some(TextureFormat::Rgba16Float),
            ColorType::Rgba1010102 => Some(TextureFormat::Rgb10a2Unorm),
            ColorType::Rgb565 => None,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, ColorType::RgbaF16)
    }
}

/// Color space the renderer draws in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// sRGB primaries, sRGB transfer.
    Srgb,
    /// sRGB primaries, linear transfer.
    LinearSrgb,
    /// Display P3 primaries, sRGB transfer.
    DisplayP3,
}

/// Window buffer pixel formats (graphics HAL values).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// RGBA_8888
    Rgba8888 = 1,
    /// RGB_565
    Rgb565 = 4,
    /// RGBA_FP16
    RgbaFp16 = 0x16,
    /// RGBA_1010102
    Rgba1010102 = 0x2B,
}

/// Window buffer dataspaces (graphics HAL values).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataspace {
    /// No dataspace set.
    Unknown = 0,
    /// BT.709 primaries, sRGB transfer, full range.
    Srgb = 0x0881_0000,
    /// DCI-P3 primaries, sRGB transfer, full range.
    DisplayP3 = 0x088A_0000,
    /// BT.709 primaries, sRGB transfer, extended range.
    Scrgb = 0x1881_0000,
    /// BT.709 primaries, linear transfer, extended range.
    ScrgbLinear = 0x1841_0000,
}

impl Dataspace {
    /// Whether the dataspace covers more than the sRGB gamut.
    pub fn is_wide(self) -> bool {
        matches!(
            self,
            Dataspace::DisplayP3 | Dataspace::Scrgb | Dataspace::ScrgbLinear
        )
    }
}

/// Resolve the dataspace for a color configuration, or `None` if unsupported.
pub fn resolve_dataspace(
    mode: ColorMode,
    color_type: ColorType,
    color_space: ColorSpace,
) -> Option<Dataspace> {
    let dataspace = match (color_type.is_float(), color_space) {
        (true, ColorSpace::LinearSrgb) => Dataspace::ScrgbLinear,
        (true, ColorSpace::Srgb) => Dataspace::Scrgb,
        (false, ColorSpace::Srgb) => Dataspace::Srgb,
        (false, ColorSpace::DisplayP3) => Dataspace::DisplayP3,
        _ => return None,
    };

    match mode {
        ColorMode::WideColorGamut if !dataspace.is_wide() => None,
        _ => Some(dataspace),
    }
}
