/// In-memory RGBA pixel buffers.
///
/// A [`Canvas`] is owned by the rasterizer for the duration of one render
/// call and then frozen into a [`Frame`], which only exposes reads.
/// Coordinates outside the buffer are silently clipped.
use visfile_core::layout::Rect;
use visfile_core::palette::Color;

/// Mutable RGBA8 buffer, top-to-bottom row order, always fully opaque.
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// A canvas filled with `background`.
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&[background.r, background.g, background.b, 0xff]);
        }
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

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Overwrite one pixel.
    #[inline]
    pub fn put(&mut self, x: i64, y: i64, c: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = c.r;
            self.pixels[i + 1] = c.g;
            self.pixels[i + 2] = c.b;
        }
    }

    /// Composite `c` over one pixel with coverage `alpha` (0..=1).
    pub fn blend(&mut self, x: i64, y: i64, c: Color, alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        if alpha >= 1.0 {
            self.put(x, y, c);
            return;
        }
        if let Some(i) = self.index(x, y) {
            let mix = |dst: u8, src: u8| (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8;
            self.pixels[i] = mix(self.pixels[i], c.r);
            self.pixels[i + 1] = mix(self.pixels[i + 1], c.g);
            self.pixels[i + 2] = mix(self.pixels[i + 2], c.b);
        }
    }

    /// Fill `rect` snapped to whole pixels. Edges round to the nearest pixel
    /// boundary, so rectangles sharing an edge tile without gaps or overlap.
    pub fn fill_rect(&mut self, rect: &Rect, c: Color) {
        let Some((x0, y0, x1, y1)) = self.snap(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(x, y, c);
            }
        }
    }

    /// 1-pixel outline along the inside of the snapped `rect`.
    pub fn stroke_rect(&mut self, rect: &Rect, c: Color) {
        let Some((x0, y0, x1, y1)) = self.snap(rect) else {
            return;
        };
        for x in x0..x1 {
            self.put(x, y0, c);
            self.put(x, y1 - 1, c);
        }
        for y in y0..y1 {
            self.put(x0, y, c);
            self.put(x1 - 1, y, c);
        }
    }

    /// Pixel span `[x0, x1) × [y0, y1)` covered by `rect`, clipped to the
    /// canvas; `None` when empty.
    fn snap(&self, rect: &Rect) -> Option<(i64, i64, i64, i64)> {
        let x0 = (rect.x.round() as i64).max(0);
        let y0 = (rect.y.round() as i64).max(0);
        let x1 = (rect.right().round() as i64).min(self.width as i64);
        let y1 = (rect.bottom().round() as i64).min(self.height as i64);
        (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
    }

    /// Freeze the buffer.
    pub fn into_frame(self) -> Frame {
        Frame {
            width: self.width,
            height: self.height,
            pixels: self.pixels,
        }
    }
}

/// A finished image: RGBA8, top-to-bottom rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA of one pixel, or `None` outside the frame.
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

    /// RGB of one pixel as a palette colour.
    pub fn color_at(&self, x: u32, y: u32) -> Option<Color> {
        self.pixel(x, y).map(|[r, g, b, _]| Color::rgb(r, g, b))
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }
}
