//! Rendering-surface abstraction
//!
//! Components never touch a browser directly. They read and mutate the page
//! through [`Dom`], which is implemented by the in-memory [`MemoryDom`] for
//! replay and tests and by the `web-sys` binding in the browser.

pub mod fixture;
pub mod geometry;
pub mod memory;
pub mod selector;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;

pub use fixture::{NodeSpec, PageFixture};
pub use geometry::{Margins, Rect};
pub use memory::MemoryDom;

/// Handle to an element owned by a [`Dom`] implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl ElementId {
    /// Get the raw index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live document/viewport measurements, read on every scroll
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// Navigation timing in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadTiming {
    pub navigation_start_ms: f64,
    /// Zero while the load handler is still running
    #[serde(default)]
    pub load_event_end_ms: f64,
    /// High resolution time since navigation start
    #[serde(default)]
    pub elapsed_since_navigation_ms: f64,
}

impl LoadTiming {
    /// Milliseconds from navigation start to load completion
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = if self.load_event_end_ms > 0.0 && self.load_event_end_ms >= self.navigation_start_ms {
            self.load_event_end_ms - self.navigation_start_ms
        } else {
            self.elapsed_since_navigation_ms
        };
        if elapsed.is_finite() && elapsed > 0.0 {
            elapsed.round() as u64
        } else {
            0
        }
    }
}

/// Which component an observer reports to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverKey {
    Reveal,
    StickyCta,
    Carousel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: Margins,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: Margins::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionEntry {
    pub target: ElementId,
    /// Visible fraction of the target inside the (margin-adjusted) viewport
    pub ratio: f64,
    pub is_intersecting: bool,
}

/// Browsers may report a crossing ratio a rounding error below the threshold
const RATIO_EPSILON: f64 = 1e-6;

impl IntersectionEntry {
    /// Whether the visible fraction reaches `threshold`
    #[inline]
    pub fn meets(&self, threshold: f64) -> bool {
        self.is_intersecting && self.ratio + RATIO_EPSILON >= threshold
    }
}

/// Observer callback payload, queued until the page drains it
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Intersection {
        key: ObserverKey,
        entries: Vec<IntersectionEntry>,
    },
    Resize {
        key: ObserverKey,
        target: ElementId,
    },
}

/// Everything a component may read from or do to the page
pub trait Dom {
    // Queries
    fn query_all(&self, selector: &str) -> Result<Vec<ElementId>>;

    fn query(&self, selector: &str) -> Result<Option<ElementId>> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    /// Descendants of `root` matching `selector`
    fn query_within(&self, root: ElementId, selector: &str) -> Result<Vec<ElementId>>;

    fn element_by_id(&self, id: &str) -> Option<ElementId>;
    fn children(&self, el: ElementId) -> Vec<ElementId>;
    fn parent(&self, el: ElementId) -> Option<ElementId>;

    /// Inclusive: an element contains itself
    fn contains(&self, ancestor: ElementId, el: ElementId) -> bool {
        let mut current = Some(el);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    // Classes
    fn has_class(&self, el: ElementId, class: &str) -> bool;
    fn add_class(&mut self, el: ElementId, class: &str);
    fn remove_class(&mut self, el: ElementId, class: &str);

    /// DOMTokenList.toggle semantics; returns whether the class is now present
    fn toggle_class(&mut self, el: ElementId, class: &str, force: Option<bool>) -> bool {
        let on = force.unwrap_or_else(|| !self.has_class(el, class));
        if on {
            self.add_class(el, class);
        } else {
            self.remove_class(el, class);
        }
        on
    }

    // Content
    fn attribute(&self, el: ElementId, name: &str) -> Option<String>;
    fn inner_html(&self, el: ElementId) -> String;
    fn set_inner_html(&mut self, el: ElementId, html: &str);

    // Style and layout
    fn style(&self, el: ElementId, property: &str) -> Option<String>;
    /// An empty value removes the inline property
    fn set_style(&mut self, el: ElementId, property: &str, value: &str);
    /// Computed `gap` in pixels; 0 when not numeric
    fn computed_gap(&self, el: ElementId) -> f64;
    fn bounding_width(&self, el: ElementId) -> f64;
    /// Flush pending style changes so a transition reset takes effect
    fn force_reflow(&mut self, el: ElementId);

    // Window
    fn scroll_metrics(&self) -> ScrollMetrics;
    fn prefers_reduced_motion(&self) -> bool;
    fn scroll_into_view(&mut self, el: ElementId, behavior: ScrollBehavior);
    /// Blocking informational notice
    fn alert(&mut self, message: &str);
    fn console_log(&mut self, line: &str);
    fn load_timing(&self) -> Option<LoadTiming>;

    // Observers
    fn observe_intersection(&mut self, key: ObserverKey, el: ElementId, options: &ObserverOptions);
    fn unobserve_intersection(&mut self, key: ObserverKey, el: ElementId);
    fn observe_resize(&mut self, key: ObserverKey, el: ElementId);
    fn take_observations(&mut self) -> Vec<Observation>;
}

/// Format a number for CSS: at most four decimals, no trailing zeros
pub fn css_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 10_000.0).round() / 10_000.0;
    // Avoid "-0"
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_number() {
        assert_eq!(css_number(50.0), "50");
        assert_eq!(css_number(33.333333333), "33.3333");
        assert_eq!(css_number(-0.0), "0");
        assert_eq!(css_number(f64::NAN), "0");
    }

    #[test]
    fn test_load_timing_prefers_load_event_end() {
        let timing = LoadTiming {
            navigation_start_ms: 1_000.0,
            load_event_end_ms: 1_842.0,
            elapsed_since_navigation_ms: 900.0,
        };
        assert_eq!(timing.elapsed_ms(), 842);
    }

    #[test]
    fn test_load_timing_falls_back_inside_load_handler() {
        let timing = LoadTiming {
            navigation_start_ms: 1_000.0,
            load_event_end_ms: 0.0,
            elapsed_since_navigation_ms: 731.6,
        };
        assert_eq!(timing.elapsed_ms(), 732);
    }

    #[test]
    fn test_entry_threshold_is_inclusive() {
        let entry = IntersectionEntry {
            target: ElementId(1),
            ratio: 0.1,
            is_intersecting: true,
        };
        assert!(entry.meets(0.1));
        assert!(!entry.meets(0.11));

        let rounded = IntersectionEntry { ratio: 0.0999999, ..entry };
        assert!(rounded.meets(0.1));
        let short = IntersectionEntry { ratio: 0.0999, ..entry };
        assert!(!short.meets(0.1));
    }
}
