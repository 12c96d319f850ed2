//! SVG badge template.
//!
//! # Invariants
//! - Counts up to five digits use the base 80px layout.
//! - Each digit past the fifth widens the badge by 6px and shifts the
//!   value text right by 3px.

const BADGE_TEMPLATE: &str = r##"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="20">
<rect width="30" height="20" fill="#555"/>
<rect x="30" width="{rec_width}" height="20" fill="#4c1"/>
<rect rx="3" width="80" height="20" fill="transparent"/>
	<g fill="#fff" text-anchor="middle"
    font-family="DejaVu Sans,Verdana,Geneva,sans-serif" font-size="11">
	    <text x="15" y="14">hits</text>
	    <text x="{text_x}" y="14">{count}</text>
	</g>
</svg>"##;

const BASE_WIDTH: usize = 80;
const BASE_REC_WIDTH: usize = 50;
const BASE_TEXT_X: usize = 55;
const BASE_DIGITS: usize = 5;
const PX_PER_DIGIT: usize = 6;

/// Geometry of one rendered badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeLayout {
    pub width: usize,
    pub rec_width: usize,
    pub text_x: usize,
}

impl BadgeLayout {
    pub fn for_digits(digits: usize) -> Self {
        let extra = digits.saturating_sub(BASE_DIGITS) * PX_PER_DIGIT;
        Self {
            width: BASE_WIDTH + extra,
            rec_width: BASE_REC_WIDTH + extra,
            text_x: BASE_TEXT_X + extra / 2,
        }
    }
}

/// Renders the badge SVG for `count`.
pub fn render_badge(count: u64) -> String {
    let text = count.to_string();
    let layout = BadgeLayout::for_digits(text.len());

    BADGE_TEMPLATE
        .replace("{width}", &layout.width.to_string())
        .replace("{rec_width}", &layout.rec_width.to_string())
        .replace("{text_x}", &layout.text_x.to_string())
        .replace("{count}", &text)
}
