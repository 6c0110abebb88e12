use crate::FaceMatchError;

/// 8-bit grayscale image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, FaceMatchError> {
        if width == 0 || height == 0 {
            return Err(FaceMatchError::InvalidImage(format!("empty image {width}x{height}")));
        }
        if pixels.len() != width * height {
            return Err(FaceMatchError::InvalidImage(format!(
                "{width}x{height} image needs {} pixels, got {}",
                width * height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// Copies the region `[x, x + w) x [y, y + h)`.
    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> Result<Self, FaceMatchError> {
        if w == 0 || h == 0 || x + w > self.width || y + h > self.height {
            return Err(FaceMatchError::RegionOutOfBounds([
                x as f32,
                y as f32,
                (x + w) as f32,
                (y + h) as f32,
            ]));
        }
        let mut pixels = Vec::with_capacity(w * h);
        for row in y..y + h {
            let start = row * self.width + x;
            pixels.extend_from_slice(&self.pixels[start..start + w]);
        }
        Self::new(w, h, pixels)
    }

    /// Nearest-neighbour resize.
    pub fn resize_nearest(&self, w: usize, h: usize) -> Result<Self, FaceMatchError> {
        let mut pixels = Vec::with_capacity(w * h);
        for y in 0..h {
            let sy = (y * self.height / h.max(1)).min(self.height - 1);
            for x in 0..w {
                let sx = (x * self.width / w.max(1)).min(self.width - 1);
                pixels.push(self.get(sx, sy));
            }
        }
        Self::new(w, h, pixels)
    }
}
