//! FAQ accordion with at most one open item

use tracing::{debug, warn};

use crate::config::FaqConfig;
use crate::dom::{Dom, ElementId};
use crate::Result;

/// Which item, if any, is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccordionState {
    open: Option<usize>,
}

impl AccordionState {
    pub fn open(&self) -> Option<usize> {
        self.open
    }

    /// Toggle item `index`, closing every other one. Returns whether it is now open.
    pub fn toggle(&mut self, index: usize) -> bool {
        self.open = if self.open == Some(index) { None } else { Some(index) };
        self.open.is_some()
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open == Some(index)
    }
}

#[derive(Debug, Clone, Copy)]
struct FaqItem {
    question: ElementId,
    answer: Option<ElementId>,
}

pub struct FaqAccordion {
    items: Vec<FaqItem>,
    state: AccordionState,
    active_class: String,
    open_class: String,
}

impl FaqAccordion {
    pub fn bind(dom: &mut dyn Dom, config: &FaqConfig) -> Result<Option<Self>> {
        let mut items = Vec::new();
        for item in dom.query_all(&config.item)? {
            let Some(question) = dom.query_within(item, &config.question)?.into_iter().next() else {
                warn!("FAQ item {} has no question, skipping", item);
                continue;
            };
            let answer = dom.query_within(item, &config.answer)?.into_iter().next();
            items.push(FaqItem { question, answer });
        }
        if items.is_empty() {
            return Ok(None);
        }

        let mut accordion = Self {
            items,
            state: AccordionState::default(),
            active_class: config.active_class.clone(),
            open_class: config.open_class.clone(),
        };
        // Markup may ship with an item pre-opened; keep only the first one
        if let Some(index) = accordion
            .items
            .iter()
            .position(|item| dom.has_class(item.question, &accordion.active_class))
        {
            accordion.state.toggle(index);
        }
        accordion.render(dom);
        debug!("FAQ accordion bound with {} items", accordion.items.len());
        Ok(Some(accordion))
    }

    fn render(&self, dom: &mut dyn Dom) {
        for (i, item) in self.items.iter().enumerate() {
            let open = self.state.is_open(i);
            dom.toggle_class(item.question, &self.active_class, Some(open));
            if let Some(answer) = item.answer {
                dom.toggle_class(answer, &self.open_class, Some(open));
            }
        }
    }

    /// Index of the item whose question is `el`
    pub fn question_index(&self, el: ElementId) -> Option<usize> {
        self.items.iter().position(|item| item.question == el)
    }

    /// Toggle item `index`; every class change happens in one call
    pub fn toggle(&mut self, dom: &mut dyn Dom, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        let open = self.state.toggle(index);
        self.render(dom);
        open
    }

    /// Handle a click on `el`; returns whether it was a question
    pub fn handle_click(&mut self, dom: &mut dyn Dom, el: ElementId) -> bool {
        match self.question_index(el) {
            Some(index) => {
                self.toggle(dom, index);
                true
            }
            None => false,
        }
    }

    pub fn open(&self) -> Option<usize> {
        self.state.open()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::ElementSpec;
    use crate::dom::MemoryDom;

    fn page(count: usize) -> (MemoryDom, Vec<(ElementId, ElementId)>) {
        let mut dom = MemoryDom::new(1000.0, 800.0);
        let root = dom.root();
        let pairs = (0..count)
            .map(|_| {
                let item = dom.append(root, ElementSpec::new("div").class("faq-item")).unwrap();
                let q = dom.append(item, ElementSpec::new("button").class("faq-question")).unwrap();
                let a = dom.append(item, ElementSpec::new("div").class("faq-answer")).unwrap();
                (q, a)
            })
            .collect();
        (dom, pairs)
    }

    fn open_count(dom: &MemoryDom, pairs: &[(ElementId, ElementId)]) -> usize {
        pairs
            .iter()
            .filter(|(q, a)| dom.has_class(*q, "active") || dom.has_class(*a, "show"))
            .count()
    }

    #[test]
    fn test_state_toggle() {
        let mut state = AccordionState::default();
        assert!(state.toggle(2));
        assert!(state.toggle(0));
        assert_eq!(state.open(), Some(0));
        assert!(!state.toggle(0));
        assert_eq!(state.open(), None);
    }

    #[test]
    fn test_clicking_a_then_b_leaves_b_open() {
        let (mut dom, pairs) = page(3);
        let mut faq = FaqAccordion::bind(&mut dom, &FaqConfig::default()).unwrap().unwrap();

        assert!(faq.handle_click(&mut dom, pairs[0].0));
        assert!(faq.handle_click(&mut dom, pairs[1].0));
        assert_eq!(faq.open(), Some(1));
        assert!(dom.has_class(pairs[1].0, "active"));
        assert!(dom.has_class(pairs[1].1, "show"));
        assert_eq!(open_count(&dom, &pairs), 1);

        faq.handle_click(&mut dom, pairs[1].0);
        assert_eq!(open_count(&dom, &pairs), 0);
    }

    #[test]
    fn test_at_most_one_open_for_any_sequence() {
        let (mut dom, pairs) = page(4);
        let mut faq = FaqAccordion::bind(&mut dom, &FaqConfig::default()).unwrap().unwrap();
        for i in [0, 0, 3, 1, 1, 2, 3, 3, 0, 2] {
            faq.handle_click(&mut dom, pairs[i].0);
            assert!(open_count(&dom, &pairs) <= 1);
        }
    }

    #[test]
    fn test_preopened_markup_is_normalized() {
        let (mut dom, pairs) = page(3);
        dom.add_class(pairs[1].0, "active");
        dom.add_class(pairs[2].0, "active");
        dom.add_class(pairs[2].1, "show");

        let faq = FaqAccordion::bind(&mut dom, &FaqConfig::default()).unwrap().unwrap();
        assert_eq!(faq.open(), Some(1));
        assert!(dom.has_class(pairs[1].1, "show"));
        assert_eq!(open_count(&dom, &pairs), 1);
    }

    #[test]
    fn test_items_without_question_are_skipped() {
        let (mut dom, pairs) = page(2);
        let root = dom.root();
        let broken = dom.append(root, ElementSpec::new("div").class("faq-item")).unwrap();
        dom.append(broken, ElementSpec::new("div").class("faq-answer")).unwrap();
        let lonely = dom.append(root, ElementSpec::new("div").class("faq-item")).unwrap();
        let lonely_q = dom.append(lonely, ElementSpec::new("button").class("faq-question")).unwrap();

        let mut faq = FaqAccordion::bind(&mut dom, &FaqConfig::default()).unwrap().unwrap();
        assert_eq!(faq.len(), 3);
        assert!(faq.handle_click(&mut dom, lonely_q));
        assert!(dom.has_class(lonely_q, "active"));
        assert!(!faq.handle_click(&mut dom, pairs[0].1));
    }
}
