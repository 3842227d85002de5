//! Owned RGB pixel buffer produced by the renderer.

use crate::color::Rgb;

/// Row-major RGB8 image, row 0 at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wrap raw pixel data; `None` if the length is not `width * height * 3`.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(3)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Wrap pixel data the renderer sized itself.
    pub(crate) fn from_composite(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 3);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Frame of a single color.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        let count = width as usize * height as usize;
        let pixels = color.0.iter().copied().cycle().take(count * 3).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Color at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        Some(Rgb([
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ]))
    }

    pub fn pixels(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.pixels
            .chunks_exact(3)
            .map(|chunk| Rgb([chunk[0], chunk[1], chunk[2]]))
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_checks_length() {
        assert!(Frame::from_raw(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_raw(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn test_pixel_lookup() {
        let pixels = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let frame = Frame::from_raw(2, 2, pixels).unwrap();
        assert_eq!(frame.pixel(1, 0), Some(Rgb::new(4, 5, 6)));
        assert_eq!(frame.pixel(0, 1), Some(Rgb::new(7, 8, 9)));
        assert_eq!(frame.pixel(2, 0), None);
    }

    #[test]
    fn test_filled() {
        let frame = Frame::filled(3, 2, Rgb::new(9, 8, 7));
        assert_eq!(frame.as_raw().len(), 18);
        assert!(frame.pixels().all(|p| p == Rgb::new(9, 8, 7)));
    }

    #[test]
    fn test_from_composite_keeps_pixels() {
        let frame = Frame::from_composite(1, 2, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(frame.pixel(0, 1), Some(Rgb::new(4, 5, 6)));
        assert_eq!(frame.into_raw(), vec![1, 2, 3, 4, 5, 6]);
    }
}
