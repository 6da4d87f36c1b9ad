//! Conversions between packed RGBA8 pixels and linear float triples.

/// A packed 8-bit RGBA pixel.
pub type Rgba8 = [u8; 4];

/// Linear RGB in `[0, 1]`.
pub type Rgb = [f32; 3];

const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

#[inline]
pub fn unpack(px: Rgba8) -> Rgb {
    [
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
    ]
}

/// Packs a float triple back into a pixel. Channels are clamped to `[0, 1]`
/// and rounded to the nearest step; alpha is always opaque.
#[inline]
pub fn pack(rgb: Rgb) -> Rgba8 {
    #[inline]
    fn channel(v: f32) -> u8 {
        (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
    }

    [channel(rgb[0]), channel(rgb[1]), channel(rgb[2]), u8::MAX]
}

#[inline]
pub fn luma(rgb: Rgb) -> f32 {
    rgb[0] * LUMA_R + rgb[1] * LUMA_G + rgb[2] * LUMA_B
}

/// Luma straight from a packed pixel.
#[inline]
pub fn luma_of(px: Rgba8) -> f32 {
    luma(unpack(px))
}
