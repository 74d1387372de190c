use crate::units::Pt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

impl Rect {
    pub fn new(x: Pt, y: Pt, width: Pt, height: Pt) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> Pt {
        self.x + self.width
    }

    pub fn bottom(&self) -> Pt {
        self.y + self.height
    }

    /// Returns true when `other` lies completely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: Pt,
    pub height: Pt,
}

impl Size {
    pub fn new(width: Pt, height: Pt) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self {
            width: Pt::ZERO,
            height: Pt::ZERO,
        }
    }
}

/// Width/height limits handed down from a container to a child.
///
/// `max_height` of `None` means unbounded (flow mode or an overflow-enabled
/// parent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxConstraints {
    pub available_width: Pt,
    /// The width percentages resolve against. Row boxes without an explicit
    /// width pass their parent's context through unchanged.
    pub percentage_base: Pt,
    pub max_height: Option<Pt>,
}

impl BoxConstraints {
    pub fn new(available_width: Pt) -> Self {
        Self {
            available_width,
            percentage_base: available_width,
            max_height: None,
        }
    }

    pub fn with_max_height(mut self, max_height: Option<Pt>) -> Self {
        self.max_height = max_height;
        self
    }

    pub fn with_percentage_base(mut self, base: Pt) -> Self {
        self.percentage_base = base;
        self
    }

    pub fn has_bounded_height(&self) -> bool {
        self.max_height.is_some()
    }

    pub fn constrain_height(&self, height: Pt) -> Pt {
        match self.max_height {
            Some(limit) => height.min(limit),
            None => height,
        }
    }
}
