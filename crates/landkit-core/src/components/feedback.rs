//! Click feedback: smooth in-page anchors and the simulated checkout on CTAs

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use crate::config::FeedbackConfig;
use crate::dom::{Dom, ElementId, ScrollBehavior};
use crate::Result;

/// A button showing the loading state
#[derive(Debug, Clone)]
struct PendingButton {
    /// Label captured by the first click
    original_html: String,
    /// Clicks whose notice has not fired yet
    outstanding: usize,
}

pub struct InteractionFeedback {
    anchors: Vec<ElementId>,
    buttons: Vec<ElementId>,
    pending: BTreeMap<ElementId, PendingButton>,
    config: FeedbackConfig,
}

impl InteractionFeedback {
    pub fn bind(dom: &dyn Dom, config: &FeedbackConfig) -> Result<Self> {
        let anchors = dom.query_all(&config.anchor_selector)?;
        let buttons = dom.query_all(&config.cta_selector)?;
        debug!(
            "Feedback bound to {} anchors and {} CTA buttons",
            anchors.len(),
            buttons.len()
        );
        Ok(Self {
            anchors,
            buttons,
            pending: BTreeMap::new(),
            config: config.clone(),
        })
    }

    pub fn is_anchor(&self, el: ElementId) -> bool {
        self.anchors.contains(&el)
    }

    pub fn is_cta(&self, el: ElementId) -> bool {
        self.buttons.contains(&el)
    }

    /// Scroll smoothly to the fragment target of an intercepted link.
    /// The caller prevents the default jump; unknown targets are ignored.
    pub fn anchor_click(&mut self, dom: &mut dyn Dom, anchor: ElementId) {
        let Some(href) = dom.attribute(anchor, "href") else {
            return;
        };
        match dom.query(&href) {
            Ok(Some(target)) => {
                debug!("Anchor {} scrolling to {}", href, target);
                dom.scroll_into_view(target, ScrollBehavior::Smooth);
            }
            Ok(None) => debug!("Anchor target {} not found", href),
            // A bare "#" is not a valid selector
            Err(e) => debug!("Anchor {} ignored: {}", href, e),
        }
    }

    /// Put a CTA into its loading state; returns the delay until its notice
    pub fn cta_click(&mut self, dom: &mut dyn Dom, button: ElementId) -> Duration {
        let pending = self.pending.entry(button).or_insert_with(|| PendingButton {
            original_html: dom.inner_html(button),
            outstanding: 0,
        });
        pending.outstanding += 1;

        dom.add_class(button, &self.config.loading_class);
        dom.set_inner_html(button, &self.config.loading_html);
        debug!("CTA {} loading ({} pending)", button, pending.outstanding);
        Duration::from_millis(self.config.delay_ms)
    }

    /// The simulated delay for one click elapsed: show the notice and, once
    /// no clicks remain outstanding, restore the button
    pub fn restore(&mut self, dom: &mut dyn Dom, button: ElementId) {
        if let Some(pending) = self.pending.get_mut(&button) {
            pending.outstanding = pending.outstanding.saturating_sub(1);
            if pending.outstanding == 0 {
                let original = pending.original_html.clone();
                self.pending.remove(&button);
                dom.remove_class(button, &self.config.loading_class);
                dom.set_inner_html(button, &original);
            }
        }
        dom.alert(&self.config.notice);
    }

    /// Buttons currently in the loading state
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
