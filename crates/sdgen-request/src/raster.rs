use std::sync::Arc;

use image::{DynamicImage, GrayImage, ImageBuffer, RgbImage, RgbaImage};

/// A raster image handed to the pipeline as a starting image or a ControlNet
/// input.
///
/// Pixel data is stored in row-major, channel-last (HWC) order.
/// For RGB images `channel == 3`; for grayscale `channel == 1`.
///
/// The pixel buffer is shared, not copied: cloning an `SdImage` (or storing
/// it in a request) bumps a reference count. The bytes are immutable, so
/// nothing the caller does after handing the image over is observable through
/// the request. Equality and hashing compare the pixel content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SdImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Number of channels per pixel (usually 3 for RGB).
    pub channel: u32,
    data: Arc<[u8]>,
}

impl SdImage {
    /// Wrap raw HWC pixel data. The length is not checked against the
    /// dimensions; see [`SdImage::to_dynamic`].
    pub fn new(width: u32, height: u32, channel: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            channel,
            data: data.into(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `true` when both images share the same pixel allocation.
    pub fn shares_pixels_with(&self, other: &SdImage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Convert from an `image` crate buffer.
    ///
    /// 8-bit luma, RGB and RGBA buffers keep their layout; every other color
    /// type is converted to RGBA8.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(buf) => Self::from_buffer(buf, 1),
            DynamicImage::ImageRgb8(buf) => Self::from_buffer(buf, 3),
            DynamicImage::ImageRgba8(buf) => Self::from_buffer(buf, 4),
            other => Self::from_buffer(&other.to_rgba8(), 4),
        }
    }

    /// Convert back into an `image` crate buffer.
    ///
    /// Returns `None` when the channel count is not 1, 3 or 4, or when the
    /// pixel data is shorter than `width * height * channel`.
    pub fn to_dynamic(&self) -> Option<DynamicImage> {
        let raw = self.data.to_vec();
        match self.channel {
            1 => GrayImage::from_raw(self.width, self.height, raw).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(self.width, self.height, raw).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(self.width, self.height, raw).map(DynamicImage::ImageRgba8),
            _ => None,
        }
    }

    fn from_buffer<P>(buf: &ImageBuffer<P, Vec<u8>>, channel: u32) -> Self
    where
        P: image::Pixel<Subpixel = u8>,
    {
        Self::new(buf.width(), buf.height(), channel, buf.as_raw().as_slice())
    }
}

impl From<RgbImage> for SdImage {
    fn from(buf: RgbImage) -> Self {
        let (width, height) = buf.dimensions();
        Self::new(width, height, 3, buf.into_raw())
    }
}

impl From<RgbaImage> for SdImage {
    fn from(buf: RgbaImage) -> Self {
        let (width, height) = buf.dimensions();
        Self::new(width, height, 4, buf.into_raw())
    }
}

impl From<GrayImage> for SdImage {
    fn from(buf: GrayImage) -> Self {
        let (width, height) = buf.dimensions();
        Self::new(width, height, 1, buf.into_raw())
    }
}

impl From<&DynamicImage> for SdImage {
    fn from(img: &DynamicImage) -> Self {
        Self::from_dynamic(img)
    }
}
