/// A point in either CSS-pixel (container) or image-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Width and height in pixels of the relevant space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Where the three layer surfaces sit inside the container, in CSS pixels.
///
/// All layers share one placement so they stay registered.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerPlacement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Affine mapping from image pixels to container CSS pixels.
///
/// `css = image * zoom + pan`. The inverse is used to turn pointer
/// positions into brush coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// CSS pixels per image pixel. Always > 0.
    pub zoom: f64,
    /// CSS offset of the image's top-left corner.
    pub pan: Point,
    /// Natural size of the original image.
    pub image: Size,
    /// Last known container size.
    pub container: Size,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::ZERO,
            image: Size::default(),
            container: Size::default(),
        }
    }
}

impl ViewTransform {
    pub fn new(image: Size) -> Self {
        Self {
            image,
            ..Self::default()
        }
    }

    /// Scale the image down to fit `container` (never up), preserving its
    /// aspect ratio, and center it.
    ///
    /// An empty `container` keeps the previously known size, the way a
    /// hidden host element reports zero client dimensions.
    pub fn fit(&mut self, container: Size, margin: f64) -> LayerPlacement {
        if !container.is_empty() {
            self.container = container;
        }
        if self.image.is_empty() {
            self.zoom = 1.0;
            self.pan = Point::ZERO;
            return self.placement();
        }

        let Size { width, height } = self.container;
        let mut draw_w = self.image.width;
        let mut draw_h = self.image.height;
        if draw_w > width {
            draw_w = width;
            draw_h = draw_w / self.image.width * self.image.height;
        }
        if draw_h > height {
            draw_h = height;
            draw_w = draw_h / self.image.height * self.image.width;
        }

        self.zoom = draw_w / self.image.width;
        if self.zoom <= 0.0 || !self.zoom.is_finite() {
            self.zoom = 1.0;
        }
        self.pan = Point::new((width - draw_w) / 2.0, (height - draw_h) / 2.0);
        self.apply_bounds(margin)
    }

    /// Clamp the pan so at least `margin` CSS pixels of the image stay
    /// inside the container on each axis, and return the shared placement.
    pub fn apply_bounds(&mut self, margin: f64) -> LayerPlacement {
        let w = self.image.width * self.zoom;
        let h = self.image.height * self.zoom;

        if self.pan.x + w < margin {
            self.pan.x = margin - w;
        }
        if self.pan.y + h < margin {
            self.pan.y = margin - h;
        }
        if !self.container.is_empty() {
            if self.pan.x > self.container.width - margin {
                self.pan.x = self.container.width - margin;
            }
            if self.pan.y > self.container.height - margin {
                self.pan.y = self.container.height - margin;
            }
        }
        self.placement()
    }

    pub fn placement(&self) -> LayerPlacement {
        LayerPlacement {
            left: self.pan.x,
            top: self.pan.y,
            width: self.image.width * self.zoom,
            height: self.image.height * self.zoom,
        }
    }

    /// Container CSS position to image pixel position.
    #[inline]
    pub fn screen_to_image(&self, p: Point) -> Point {
        Point::new((p.x - self.pan.x) / self.zoom, (p.y - self.pan.y) / self.zoom)
    }

    /// Image pixel position to container CSS position.
    #[inline]
    pub fn image_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }

    /// Whether an image-space point lies on the image.
    pub fn contains_image_point(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.image.width && p.y < self.image.height
    }
}
