//! Fixed slide geometry.
//!
//! All coordinates are EMUs on a 16:9 slide of 10in × 5.625in.

use serde::Serialize;

/// EMUs per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Slide width (10in).
pub const SLIDE_WIDTH: i64 = 9_144_000;

/// Slide height (5.625in).
pub const SLIDE_HEIGHT: i64 = 5_143_500;

/// Notes page size (portrait 7.5in × 10in).
pub const NOTES_WIDTH: i64 = 6_858_000;
pub const NOTES_HEIGHT: i64 = 9_144_000;

/// Title font size in points.
pub const TITLE_FONT_SIZE_PT: u32 = 36;

/// Bullet font size in points.
pub const BODY_FONT_SIZE_PT: u32 = 18;

/// Space before each bullet paragraph in points.
pub const BULLET_SPACING_PT: u32 = 5;

/// Bullet hanging indent (0.3125in).
pub const BULLET_INDENT: i64 = 285_750;

const MARGIN_LEFT: i64 = EMU_PER_INCH / 2;
const TITLE_TOP: i64 = EMU_PER_INCH / 2;
const TITLE_HEIGHT: i64 = EMU_PER_INCH;
// 1.8in
const BODY_TOP: i64 = EMU_PER_INCH * 18 / 10;
const BODY_HEIGHT: i64 = EMU_PER_INCH * 3;

/// A positioned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub const fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    /// Right edge.
    pub fn right(&self) -> i64 {
        self.x + self.cx
    }

    /// Bottom edge.
    pub fn bottom(&self) -> i64 {
        self.y + self.cy
    }

    /// Whether the two frames share any area.
    pub fn overlaps(&self, other: &Frame) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Width as a whole percentage of the slide width.
    pub fn width_percent(&self) -> i64 {
        self.cx * 100 / SLIDE_WIDTH
    }
}

/// Percentage of the slide width in EMUs.
fn width_pct(pct: i64) -> i64 {
    SLIDE_WIDTH * pct / 100
}

/// Regions used on one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideLayout {
    pub title: Frame,
    pub body: Frame,
    pub image: Option<Frame>,
}

impl SlideLayout {
    /// Layout for a slide with or without a generated image.
    ///
    /// With an image the bullets take the left half and the picture sits at
    /// 55%..95% of the width; without one the bullets span 90% of the width.
    pub fn for_slide(has_image: bool) -> Self {
        let title = Frame::new(MARGIN_LEFT, TITLE_TOP, width_pct(90), TITLE_HEIGHT);

        if has_image {
            Self {
                title,
                body: Frame::new(MARGIN_LEFT, BODY_TOP, width_pct(50), BODY_HEIGHT),
                image: Some(Frame::new(width_pct(55), BODY_TOP, width_pct(40), BODY_HEIGHT)),
            }
        } else {
            Self {
                title,
                body: Frame::new(MARGIN_LEFT, BODY_TOP, width_pct(90), BODY_HEIGHT),
                image: None,
            }
        }
    }
}

/// Points to hundredths of a point, as used by `sz` and `spcPts`.
pub fn centipoints(pt: u32) -> u32 {
    pt * 100
}
