//! Pointer input as the editor sees it, and stamp interpolation.

use putimage_core::Point;

use crate::surface::CompositeOp;

/// Which pointer button is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button, pen tip, or touch contact: paints.
    Primary,
    /// Right button: erases.
    Secondary,
    /// Anything else; never starts a stroke.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// Keyboard modifiers held during a pointer or wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        meta: false,
        alt: false,
        shift: false,
    };

    /// Ctrl, Cmd or Alt turns a click into a color pick.
    pub fn picks_color(&self) -> bool {
        self.ctrl || self.meta || self.alt
    }

    pub fn any(&self) -> bool {
        self.ctrl || self.meta || self.alt || self.shift
    }
}

/// One pointer event, positioned in container CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pos: Point,
    pub button: Option<PointerButton>,
    pub kind: PointerKind,
    /// Reported pressure in `[0, 1]`; ignored for mice.
    pub pressure: f64,
    pub modifiers: Modifiers,
    /// Event timestamp in milliseconds.
    pub time_ms: f64,
}

impl PointerInput {
    /// A plain mouse event with no buttons held.
    pub fn mouse(pos: Point, time_ms: f64) -> Self {
        Self {
            pos,
            button: None,
            kind: PointerKind::Mouse,
            pressure: 1.0,
            modifiers: Modifiers::NONE,
            time_ms,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_kind(mut self, kind: PointerKind, pressure: f64) -> Self {
        self.kind = kind;
        self.pressure = pressure;
        self
    }
}

/// What a stroke does to its target surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeAction {
    Paint,
    Erase,
}

impl StrokeAction {
    pub fn from_button(button: PointerButton) -> Option<Self> {
        match button {
            PointerButton::Primary => Some(Self::Paint),
            PointerButton::Secondary => Some(Self::Erase),
            PointerButton::Other => None,
        }
    }

    pub fn op(self) -> CompositeOp {
        match self {
            Self::Paint => CompositeOp::SourceOver,
            Self::Erase => CompositeOp::DestinationOut,
        }
    }
}

/// Stamp centers from `from` towards `to`, one every `step` image pixels.
///
/// Starts at `from` and stops short of `to`; the next segment begins
/// there. Coincident points yield nothing.
pub fn interpolate(from: Point, to: Point, step: f64) -> Vec<Point> {
    let distance = from.distance(to);
    if distance <= 0.0 || !distance.is_finite() {
        return Vec::new();
    }
    let step = if step > 0.0 { step } else { 1.0 };
    let ux = (to.x - from.x) / distance;
    let uy = (to.y - from.y) / distance;

    let count = (distance / step).ceil() as usize;
    (0..count)
        .map(|i| {
            let t = i as f64 * step;
            Point::new(from.x + ux * t, from.y + uy * t)
        })
        .collect()
}
