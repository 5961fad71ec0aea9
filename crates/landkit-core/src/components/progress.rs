//! Scroll progress bar

use tracing::debug;

use crate::config::ProgressConfig;
use crate::dom::{css_number, Dom, ElementId, ScrollMetrics};

/// Percentage of the scrollable range already scrolled, always in 0..=100
pub fn scroll_percent(metrics: &ScrollMetrics) -> f64 {
    let range = metrics.document_height - metrics.viewport_height;
    // No scrollable overflow
    if !range.is_finite() || range <= 0.0 {
        return 0.0;
    }
    let percent = metrics.scroll_top / range * 100.0;
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub struct ScrollProgress {
    bar: ElementId,
    last: Option<f64>,
}

impl ScrollProgress {
    pub fn bind(dom: &dyn Dom, config: &ProgressConfig) -> Option<Self> {
        let bar = dom.element_by_id(&config.bar_id)?;
        debug!("Progress bar bound to #{}", config.bar_id);
        Some(Self { bar, last: None })
    }

    pub fn on_scroll(&mut self, dom: &mut dyn Dom) {
        let percent = scroll_percent(&dom.scroll_metrics());
        if self.last == Some(percent) {
            return;
        }
        self.last = Some(percent);
        dom.set_style(self.bar, "width", &format!("{}%", css_number(percent)));
    }

    pub fn percent(&self) -> f64 {
        self.last.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::ElementSpec;
    use crate::dom::MemoryDom;

    fn metrics(scroll_top: f64, document_height: f64, viewport_height: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top,
            document_height,
            viewport_height,
        }
    }

    #[test]
    fn test_scroll_percent() {
        assert_eq!(scroll_percent(&metrics(0.0, 2000.0, 1000.0)), 0.0);
        assert_eq!(scroll_percent(&metrics(500.0, 2000.0, 1000.0)), 50.0);
        assert_eq!(scroll_percent(&metrics(1000.0, 2000.0, 1000.0)), 100.0);
        // Overscroll and rubber banding
        assert_eq!(scroll_percent(&metrics(1200.0, 2000.0, 1000.0)), 100.0);
        assert_eq!(scroll_percent(&metrics(-40.0, 2000.0, 1000.0)), 0.0);
    }

    #[test]
    fn test_no_overflow_is_finite() {
        for top in [0.0, 10.0, -5.0] {
            let p = scroll_percent(&metrics(top, 800.0, 800.0));
            assert!(p.is_finite());
            assert_eq!(p, 0.0);
        }
        assert_eq!(scroll_percent(&metrics(0.0, 600.0, 800.0)), 0.0);
        assert_eq!(scroll_percent(&metrics(f64::NAN, 2000.0, 800.0)), 0.0);
        assert_eq!(scroll_percent(&metrics(0.0, f64::INFINITY, 800.0)), 0.0);
    }

    #[test]
    fn test_bar_width_follows_scroll() {
        let mut dom = MemoryDom::new(1000.0, 1000.0);
        let root = dom.root();
        let bar = dom.append(root, ElementSpec::new("div").id("progress-bar")).unwrap();
        dom.set_document_height(Some(4000.0));

        let mut progress = ScrollProgress::bind(&dom, &ProgressConfig::default()).unwrap();
        dom.set_scroll_y(1000.0);
        progress.on_scroll(&mut dom);
        assert_eq!(dom.style(bar, "width").as_deref(), Some("33.3333%"));

        dom.set_scroll_y(3000.0);
        progress.on_scroll(&mut dom);
        assert_eq!(dom.style(bar, "width").as_deref(), Some("100%"));
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn test_missing_bar_disables_component() {
        let dom = MemoryDom::new(1000.0, 1000.0);
        assert!(ScrollProgress::bind(&dom, &ProgressConfig::default()).is_none());
    }
}
