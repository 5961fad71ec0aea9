//! Sticky call-to-action bar shown once the hero scrolls away

use tracing::debug;

use crate::config::StickyCtaConfig;
use crate::dom::{Dom, ElementId, IntersectionEntry, ObserverKey, ObserverOptions};

pub struct StickyCta {
    bar: ElementId,
    hero: ElementId,
    threshold: f64,
    class: String,
}

impl StickyCta {
    /// Both the bar and the hero section are required
    pub fn bind(dom: &mut dyn Dom, config: &StickyCtaConfig) -> Option<Self> {
        let bar = dom.element_by_id(&config.bar_id)?;
        let hero = dom.element_by_id(&config.hero_id)?;

        let options = ObserverOptions {
            threshold: config.threshold,
            ..Default::default()
        };
        dom.observe_intersection(ObserverKey::StickyCta, hero, &options);
        debug!("Sticky CTA watching #{}", config.hero_id);

        Some(Self {
            bar,
            hero,
            threshold: config.threshold,
            class: config.visible_class.clone(),
        })
    }

    /// Level-triggered: every entry re-evaluates visibility
    pub fn on_entries(&mut self, dom: &mut dyn Dom, entries: &[IntersectionEntry]) {
        for entry in entries.iter().filter(|e| e.target == self.hero) {
            let show = !entry.meets(self.threshold);
            dom.toggle_class(self.bar, &self.class, Some(show));
        }
    }

    pub fn is_visible(&self, dom: &dyn Dom) -> bool {
        dom.has_class(self.bar, &self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::ElementSpec;
    use crate::dom::{MemoryDom, Observation};

    fn page() -> MemoryDom {
        let mut dom = MemoryDom::new(1000.0, 800.0);
        let root = dom.root();
        dom.append(root, ElementSpec::new("section").id("hero").rect(0.0, 0.0, 1000.0, 1000.0))
            .unwrap();
        dom.append(root, ElementSpec::new("div").id("fixed-cta")).unwrap();
        dom.set_document_height(Some(5000.0));
        dom
    }

    fn drain(dom: &mut MemoryDom, cta: &mut StickyCta) {
        for observation in dom.take_observations() {
            if let Observation::Intersection { entries, .. } = observation {
                cta.on_entries(dom, &entries);
            }
        }
    }

    #[test]
    fn test_bar_toggles_with_hero_visibility() {
        let mut dom = page();
        let mut cta = StickyCta::bind(&mut dom, &StickyCtaConfig::default()).unwrap();
        drain(&mut dom, &mut cta);
        assert!(!cta.is_visible(&dom));

        // 50 of 1000px left: below 10%
        dom.set_scroll_y(950.0);
        drain(&mut dom, &mut cta);
        assert!(cta.is_visible(&dom));

        // Exactly 10% visible hides it again
        dom.set_scroll_y(900.0);
        drain(&mut dom, &mut cta);
        assert!(!cta.is_visible(&dom));

        dom.set_scroll_y(3000.0);
        drain(&mut dom, &mut cta);
        assert!(cta.is_visible(&dom));
    }

    #[test]
    fn test_crossing_ratio_rounded_below_threshold_hides_bar() {
        let mut dom = page();
        dom.set_scroll_y(2000.0);
        let mut cta = StickyCta::bind(&mut dom, &StickyCtaConfig::default()).unwrap();
        drain(&mut dom, &mut cta);
        assert!(cta.is_visible(&dom));

        let hero = dom.element_by_id("hero").unwrap();
        cta.on_entries(
            &mut dom,
            &[IntersectionEntry {
                target: hero,
                ratio: 0.0999999,
                is_intersecting: true,
            }],
        );
        assert!(!cta.is_visible(&dom));
    }

    #[test]
    fn test_shown_when_loaded_below_hero() {
        let mut dom = page();
        dom.set_scroll_y(2000.0);
        let mut cta = StickyCta::bind(&mut dom, &StickyCtaConfig::default()).unwrap();
        drain(&mut dom, &mut cta);
        assert!(cta.is_visible(&dom));
    }

    #[test]
    fn test_requires_both_elements() {
        let mut dom = MemoryDom::new(1000.0, 800.0);
        let root = dom.root();
        dom.append(root, ElementSpec::new("div").id("fixed-cta")).unwrap();
        assert!(StickyCta::bind(&mut dom, &StickyCtaConfig::default()).is_none());
        assert!(dom.take_observations().is_empty());
    }
}
