use crate::color::{self, Rgba8};
use crate::error::HdrError;

/// An owned RGBA8 image, rows stored top to bottom without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Rgba8>,
}

impl Image {
    /// Creates a `width` x `height` image filled with `fill`.
    pub fn new(width: usize, height: usize, fill: Rgba8) -> Result<Self, HdrError> {
        check_dimensions(width, height)?;

        Ok(Self {
            width,
            height,
            pixels: vec![fill; width * height],
        })
    }

    /// Wraps raw interleaved RGBA bytes.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, HdrError> {
        check_dimensions(width, height)?;

        let expected = width * height * 4;
        if data.len() != expected {
            return Err(HdrError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let pixels = bytemuck::cast_slice::<u8, Rgba8>(&data).to_vec();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Self, HdrError>
    where
        F: FnMut(usize, usize) -> Rgba8,
    {
        check_dimensions(width, height)?;

        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba8 {
        self.pixels[y * self.width + x]
    }

    /// Luma of the pixel at `(x, y)`.
    #[inline]
    pub fn luma(&self, x: usize, y: usize) -> f32 {
        color::luma_of(self.pixel(x, y))
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[Rgba8] {
        let start = y * self.width;
        &self.pixels[start..start + self.width]
    }

    #[inline]
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Rgba8] {
        &mut self.pixels
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// A black, fully transparent image of the same size.
    #[inline]
    pub fn copy_zeroed(&self) -> Image {
        Image {
            width: self.width,
            height: self.height,
            pixels: vec![[0; 4]; self.pixels.len()],
        }
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<(), HdrError> {
    if width == 0 || height == 0 {
        return Err(HdrError::InvalidDimensions { width, height });
    }

    Ok(())
}
