//! Scroll-triggered reveal: one-shot class flip per element

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::RevealConfig;
use crate::dom::{Dom, ElementId, IntersectionEntry, ObserverKey, ObserverOptions};
use crate::Result;

pub struct RevealObserver {
    class: String,
    threshold: f64,
    /// Targets still waiting to be revealed
    watching: BTreeSet<ElementId>,
    revealed: usize,
}

impl RevealObserver {
    /// Observe every tagged element; `None` when the page has none
    pub fn bind(dom: &mut dyn Dom, config: &RevealConfig) -> Result<Option<Self>> {
        let targets = dom.query_all(&config.selector)?;
        if targets.is_empty() {
            return Ok(None);
        }

        let options = ObserverOptions {
            threshold: config.threshold,
            root_margin: config.root_margin.parse()?,
        };
        for &el in &targets {
            dom.observe_intersection(ObserverKey::Reveal, el, &options);
        }
        debug!("Reveal observer watching {} elements", targets.len());

        Ok(Some(Self {
            class: config.class.clone(),
            threshold: config.threshold,
            watching: targets.into_iter().collect(),
            revealed: 0,
        }))
    }

    pub fn on_entries(&mut self, dom: &mut dyn Dom, entries: &[IntersectionEntry]) {
        for entry in entries {
            if !entry.meets(self.threshold) {
                continue;
            }
            // Late entries for an already revealed target are ignored
            if self.watching.remove(&entry.target) {
                dom.add_class(entry.target, &self.class);
                dom.unobserve_intersection(ObserverKey::Reveal, entry.target);
                self.revealed += 1;
            }
        }
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn pending(&self) -> usize {
        self.watching.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::ElementSpec;
    use crate::dom::{MemoryDom, Observation};

    fn page() -> (MemoryDom, Vec<ElementId>) {
        let mut dom = MemoryDom::new(1000.0, 800.0);
        let root = dom.root();
        let cards = [100.0, 1000.0, 2000.0]
            .iter()
            .map(|&y| {
                dom.append(root, ElementSpec::new("div").class("reveal").rect(0.0, y, 1000.0, 300.0))
                    .unwrap()
            })
            .collect();
        (dom, cards)
    }

    fn drain(dom: &mut MemoryDom, reveal: &mut RevealObserver) {
        for observation in dom.take_observations() {
            if let Observation::Intersection { entries, .. } = observation {
                reveal.on_entries(dom, &entries);
            }
        }
    }

    #[test]
    fn test_reveals_visible_elements_once() {
        let (mut dom, cards) = page();
        let mut reveal = RevealObserver::bind(&mut dom, &RevealConfig::default())
            .unwrap()
            .unwrap();
        drain(&mut dom, &mut reveal);

        assert!(dom.has_class(cards[0], "in"));
        assert!(!dom.has_class(cards[1], "in"));
        assert_eq!(reveal.revealed(), 1);
        assert_eq!(reveal.pending(), 2);

        dom.set_scroll_y(400.0);
        drain(&mut dom, &mut reveal);
        assert!(dom.has_class(cards[1], "in"));

        // Scrolling back never un-reveals
        dom.set_scroll_y(0.0);
        drain(&mut dom, &mut reveal);
        assert!(dom.has_class(cards[1], "in"));
        assert_eq!(reveal.revealed(), 2);
    }

    #[test]
    fn test_bottom_margin_delays_reveal() {
        let (mut dom, cards) = page();
        let mut reveal = RevealObserver::bind(&mut dom, &RevealConfig::default())
            .unwrap()
            .unwrap();
        drain(&mut dom, &mut reveal);

        // Viewport bottom 1050, shrunk to 1000: card at 1000 touches only
        dom.set_scroll_y(250.0);
        drain(&mut dom, &mut reveal);
        assert!(!dom.has_class(cards[1], "in"));

        // 30px of 300 = exactly 10%
        dom.set_scroll_y(280.0);
        drain(&mut dom, &mut reveal);
        assert!(dom.has_class(cards[1], "in"));
    }

    #[test]
    fn test_crossing_ratio_rounded_below_threshold_reveals() {
        let (mut dom, cards) = page();
        let mut reveal = RevealObserver::bind(&mut dom, &RevealConfig::default())
            .unwrap()
            .unwrap();
        drain(&mut dom, &mut reveal);
        assert!(!dom.has_class(cards[2], "in"));

        reveal.on_entries(
            &mut dom,
            &[IntersectionEntry {
                target: cards[2],
                ratio: 0.0999999,
                is_intersecting: true,
            }],
        );
        assert!(dom.has_class(cards[2], "in"));
        assert_eq!(reveal.revealed(), 2);
    }

    #[test]
    fn test_duplicate_entries_are_idempotent() {
        let (mut dom, cards) = page();
        let mut reveal = RevealObserver::bind(&mut dom, &RevealConfig::default())
            .unwrap()
            .unwrap();
        let entry = IntersectionEntry {
            target: cards[2],
            ratio: 0.5,
            is_intersecting: true,
        };
        reveal.on_entries(&mut dom, &[entry, entry]);
        reveal.on_entries(&mut dom, &[entry]);
        assert_eq!(reveal.revealed(), 1);
        assert_eq!(dom.classes(cards[2]), ["reveal".to_string(), "in".to_string()]);
    }

    #[test]
    fn test_no_targets_means_no_observer() {
        let mut dom = MemoryDom::new(1000.0, 800.0);
        assert!(RevealObserver::bind(&mut dom, &RevealConfig::default())
            .unwrap()
            .is_none());
    }
}
