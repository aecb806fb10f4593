use domainplot_core::Rgb;

/// An RGBA pixel buffer representing a rendered image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl RenderBuffer {
    /// Bytes per pixel.
    pub const CHANNELS: usize = 4;

    /// Create a new buffer filled with black (opaque).
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * Self::CHANNELS];
        for chunk in pixels.chunks_exact_mut(Self::CHANNELS) {
            chunk[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Length in bytes of one row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * Self::CHANNELS
    }

    /// Color at `(col, row)`, or `None` outside the image.
    pub fn pixel(&self, col: u32, row: u32) -> Option<Rgb> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let idx = row as usize * self.stride() + col as usize * Self::CHANNELS;
        let px = &self.pixels[idx..idx + Self::CHANNELS];
        Some(Rgb::new(px[0], px[1], px[2]))
    }

    /// Overwrite the pixel at `(col, row)`. Out-of-range writes are ignored.
    pub fn put(&mut self, col: u32, row: u32, color: Rgb) {
        if col >= self.width || row >= self.height {
            return;
        }
        let idx = row as usize * self.stride() + col as usize * Self::CHANNELS;
        self.pixels[idx..idx + Self::CHANNELS].copy_from_slice(&color.to_rgba());
    }

    /// Mutable RGBA bytes of one row.
    pub fn row_mut(&mut self, row: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = row as usize * stride;
        &mut self.pixels[start..start + stride]
    }

    /// Iterate over every pixel's color in row-major order.
    pub fn colors(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.pixels
            .chunks_exact(Self::CHANNELS)
            .map(|px| Rgb::new(px[0], px[1], px[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_black_opaque() {
        let buf = RenderBuffer::new(4, 4);
        assert_eq!(buf.pixels.len(), 4 * 4 * 4);
        for chunk in buf.pixels.chunks_exact(4) {
            assert_eq!(chunk, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn put_writes_correct_pixel() {
        let mut buf = RenderBuffer::new(8, 8);
        buf.put(2, 1, Rgb::new(255, 0, 0));

        let idx = ((1 * 8) + 2) * 4;
        assert_eq!(&buf.pixels[idx..idx + 4], &[255, 0, 0, 255]);
        assert_eq!(buf.pixel(2, 1), Some(Rgb::new(255, 0, 0)));

        // Neighbours untouched.
        assert_eq!(buf.pixel(3, 1), Some(Rgb::new(0, 0, 0)));
        assert_eq!(buf.pixel(2, 0), Some(Rgb::new(0, 0, 0)));
    }

    #[test]
    fn out_of_range_access() {
        let mut buf = RenderBuffer::new(2, 2);
        assert_eq!(buf.pixel(2, 0), None);
        assert_eq!(buf.pixel(0, 2), None);
        buf.put(5, 5, Rgb::UNDEFINED);
        assert!(buf.colors().all(|c| c == Rgb::new(0, 0, 0)));
    }

    #[test]
    fn row_mut_spans_one_row() {
        let mut buf = RenderBuffer::new(3, 2);
        let row = buf.row_mut(1);
        assert_eq!(row.len(), 12);
        row[0] = 9;
        assert_eq!(buf.pixel(0, 1), Some(Rgb::new(9, 0, 0)));
    }
}
