//! Layout rectangles and intersection math for headless observers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in document coordinates (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Grow (positive) or shrink (negative) each edge
    pub fn expand(&self, margins: &Margins) -> Rect {
        Rect::new(
            self.x - margins.left,
            self.y - margins.top,
            self.width + margins.left + margins.right,
            self.height + margins.top + margins.bottom,
        )
    }

    /// Overlap with `other`, edge-inclusive; `None` when disjoint
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// Visible fraction of `target` inside `root` plus whether they touch at all
///
/// Zero-area targets report 1.0 while touching the root, matching
/// IntersectionObserver.
pub fn intersection_ratio(target: &Rect, root: &Rect) -> (f64, bool) {
    match target.intersection(root) {
        None => (0.0, false),
        Some(overlap) => {
            let area = target.area();
            if area <= 0.0 {
                (1.0, true)
            } else {
                ((overlap.area() / area).clamp(0.0, 1.0), true)
            }
        }
    }
}

/// Root margin in pixels (CSS order: top, right, bottom, left)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

fn parse_length(token: &str) -> Option<f64> {
    let number = token.strip_suffix("px").unwrap_or(token);
    // Bare numbers are only valid when zero
    if number.len() == token.len() && token != "0" {
        return None;
    }
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl FromStr for Margins {
    type Err = crate::Error;

    /// Parse a CSS `rootMargin` with one to four pixel values
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_whitespace()
            .map(parse_length)
            .collect::<Option<Vec<f64>>>()
            .ok_or_else(|| crate::Error::Config(format!("invalid root margin '{}'", s)))?;

        let margins = match values.as_slice() {
            [all] => Margins { top: *all, right: *all, bottom: *all, left: *all },
            [vertical, horizontal] => Margins {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            },
            [top, horizontal, bottom] => Margins {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            },
            [top, right, bottom, left] => Margins {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            },
            _ => {
                return Err(crate::Error::Config(format!(
                    "root margin '{}' needs one to four values",
                    s
                )))
            }
        };
        Ok(margins)
    }
}

impl fmt::Display for Margins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px {}px {}px {}px",
            self.top, self.right, self.bottom, self.left
        )
    }
}
