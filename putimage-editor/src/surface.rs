use image::RgbaImage;

use putimage_core::Point;

/// How a stamped disc combines with the existing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOp {
    /// Paint the brush color over the surface.
    SourceOver,
    /// Remove paint, leaving transparent black.
    DestinationOut,
}

/// An RGBA8 raster backing one editor layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl Surface {
    /// A fully transparent surface.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// A surface filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: rgba.repeat(width as usize * height as usize),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    pub fn same_size(&self, other: &Surface) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Number of pixels with non-zero alpha.
    pub fn coverage(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    /// Fill a hard-edged disc of `radius` image pixels around `center`.
    ///
    /// A pixel is covered when its center lies inside the disc. Returns
    /// `true` if any pixel was touched.
    pub fn stamp_disc(&mut self, center: Point, radius: f64, op: CompositeOp, rgb: [u8; 3]) -> bool {
        if radius <= 0.0 || self.width == 0 || self.height == 0 {
            return false;
        }
        let min_x = (center.x - radius).floor().max(0.0);
        let min_y = (center.y - radius).floor().max(0.0);
        let max_x = (center.x + radius).ceil().min(self.width as f64 - 1.0);
        let max_y = (center.y + radius).ceil().min(self.height as f64 - 1.0);
        if min_x > max_x || min_y > max_y {
            return false;
        }

        let r2 = radius * radius;
        let stride = self.width as usize * 4;
        let value = match op {
            CompositeOp::SourceOver => [rgb[0], rgb[1], rgb[2], 255],
            CompositeOp::DestinationOut => [0, 0, 0, 0],
        };

        let mut touched = false;
        for y in min_y as u32..=max_y as u32 {
            let dy = y as f64 + 0.5 - center.y;
            let row = y as usize * stride;
            for x in min_x as u32..=max_x as u32 {
                let dx = x as f64 + 0.5 - center.x;
                if dx * dx + dy * dy <= r2 {
                    let i = row + x as usize * 4;
                    self.pixels[i..i + 4].copy_from_slice(&value);
                    touched = true;
                }
            }
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_surface_is_empty() {
        let s = Surface::transparent(4, 3);
        assert_eq!(s.pixels.len(), 4 * 3 * 4);
        assert_eq!(s.coverage(), 0);
    }

    #[test]
    fn filled_surface_repeats_color() {
        let s = Surface::filled(2, 2, [1, 2, 3, 255]);
        for chunk in s.pixels.chunks_exact(4) {
            assert_eq!(chunk, &[1, 2, 3, 255]);
        }
    }

    #[test]
    fn stamp_covers_disc_only() {
        let mut s = Surface::transparent(20, 20);
        assert!(s.stamp_disc(Point::new(10.0, 10.0), 3.0, CompositeOp::SourceOver, [9, 8, 7]));
        assert_eq!(s.pixel(10, 10), Some([9, 8, 7, 255]));
        assert_eq!(s.pixel(12, 10), Some([9, 8, 7, 255]));
        assert_eq!(s.pixel(14, 10), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
        // A radius-3 disc covers roughly pi * 9 pixels.
        let covered = s.coverage();
        assert!((24..=32).contains(&covered), "covered {covered}");
    }

    #[test]
    fn stamp_clips_at_edges() {
        let mut s = Surface::transparent(8, 8);
        assert!(s.stamp_disc(Point::new(0.0, 0.0), 2.0, CompositeOp::SourceOver, [0, 0, 0]));
        assert_eq!(s.pixel(0, 0).unwrap()[3], 255);
        assert!(!s.stamp_disc(Point::new(-50.0, -50.0), 2.0, CompositeOp::SourceOver, [0, 0, 0]));
    }

    #[test]
    fn destination_out_erases() {
        let mut s = Surface::filled(10, 10, [200, 100, 50, 255]);
        s.stamp_disc(Point::new(5.0, 5.0), 2.0, CompositeOp::DestinationOut, [255, 255, 255]);
        assert_eq!(s.pixel(5, 5), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(0, 0), Some([200, 100, 50, 255]));
    }

    #[test]
    fn image_conversion_keeps_pixels() {
        let mut s = Surface::transparent(3, 2);
        s.stamp_disc(Point::new(1.5, 1.0), 0.8, CompositeOp::SourceOver, [1, 1, 1]);
        let back = Surface::from_image(s.to_image().unwrap());
        assert_eq!(back, s);
    }
}
