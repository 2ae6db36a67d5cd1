//! Rectangle alignment helpers for origin-relative placement.

use std::ops::BitOr;

/// Alignment flags. Combine edges with `|`: `Align::TOP | Align::LEFT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Align(u8);

impl Align {
    pub const CENTER: Align = Align(0);
    pub const LEFT: Align = Align(1);
    pub const RIGHT: Align = Align(2);
    pub const TOP: Align = Align(4);
    pub const BOTTOM: Align = Align(8);
    pub const TOP_LEFT: Align = Align(4 | 1);
    pub const TOP_RIGHT: Align = Align(4 | 2);
    pub const BOTTOM_LEFT: Align = Align(8 | 1);
    pub const BOTTOM_RIGHT: Align = Align(8 | 2);

    /// Top-left corner of a `(w, h)` rectangle aligned to `(x, y)`.
    pub fn rect(self, x: i32, y: i32, w: i32, h: i32) -> (i32, i32) {
        (
            Align(self.0 & (Self::LEFT.0 | Self::RIGHT.0)).line(x, w),
            Align(self.0 & (Self::TOP.0 | Self::BOTTOM.0)).line(y, h),
        )
    }

    /// Starting coordinate of a span of length `w` aligned to `x`
    /// (works for both axes).
    pub fn line(self, x: i32, w: i32) -> i32 {
        let start = self.0 & (Self::LEFT.0 | Self::TOP.0) != 0;
        let end = self.0 & (Self::RIGHT.0 | Self::BOTTOM.0) != 0;
        if start {
            x
        } else if end {
            x - w
        } else {
            x - w / 2
        }
    }
}

impl BitOr for Align {
    type Output = Align;

    fn bitor(self, rhs: Align) -> Align {
        Align(self.0 | rhs.0)
    }
}
