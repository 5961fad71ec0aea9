//! Page lifecycle: wires every component at DOM ready and routes events,
//! timers and observer callbacks to them.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::components::{
    Carousel, EntranceSequencer, FaqAccordion, InteractionFeedback, LoadTelemetry, RevealObserver,
    ScrollProgress, StickyCta,
};
use crate::config::AppConfig;
use crate::dom::{Dom, ElementId, Observation, ObserverKey};
use crate::event::{Dispatch, PageEvent};
use crate::motion::Animator;
use crate::timer::TimerQueue;
use crate::Result;

/// Deferred work scheduled on the page clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// The simulated checkout delay for a CTA click elapsed
    RestoreCta(ElementId),
}

/// Keep a component that failed to bind from taking its siblings down
fn bind_or_disable<T>(name: &str, result: Result<Option<T>>) -> Option<T> {
    match result {
        Ok(component) => {
            if component.is_none() {
                debug!("{} not present on page", name);
            }
            component
        }
        Err(e) => {
            warn!("{} disabled: {}", name, e);
            None
        }
    }
}

pub struct Page<D: Dom> {
    dom: D,
    config: AppConfig,
    animator: Option<Box<dyn Animator>>,
    timers: TimerQueue<Task>,
    ready: bool,
    reveal: Option<RevealObserver>,
    entrance: EntranceSequencer,
    feedback: Option<InteractionFeedback>,
    progress: Option<ScrollProgress>,
    carousel: Option<Carousel>,
    faq: Option<FaqAccordion>,
    sticky_cta: Option<StickyCta>,
    telemetry: Option<LoadTelemetry>,
}

impl<D: Dom> Page<D> {
    pub fn new(dom: D, config: AppConfig) -> Self {
        let entrance = EntranceSequencer::new(config.entrance.clone());
        Self {
            dom,
            config,
            animator: None,
            timers: TimerQueue::new(),
            ready: false,
            reveal: None,
            entrance,
            feedback: None,
            progress: None,
            carousel: None,
            faq: None,
            sticky_cta: None,
            telemetry: None,
        }
    }

    /// Provide the animation capability used by the entrance sequence
    pub fn with_animator(mut self, animator: Box<dyn Animator>) -> Self {
        self.animator = Some(animator);
        self
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Deliver one event, then drain whatever the observers queued
    pub fn dispatch(&mut self, event: PageEvent, now: Duration) -> Dispatch {
        trace!(?event, "Dispatch");
        let mut outcome = Dispatch::default();

        match event {
            PageEvent::DomReady => self.init(now),
            // No listeners exist before DOM ready
            _ if !self.ready => {}
            PageEvent::Scroll => {
                if let Some(progress) = self.progress.as_mut() {
                    progress.on_scroll(&mut self.dom);
                }
            }
            PageEvent::Click { target } => {
                outcome.default_prevented = self.on_click(target, now);
            }
            PageEvent::TouchStart { target, x } => {
                if let Some(carousel) = self.carousel.as_mut() {
                    if carousel.in_track(&self.dom, target) {
                        carousel.touch_start(x);
                    }
                }
            }
            PageEvent::TouchEnd { target, x } => {
                if let Some(carousel) = self.carousel.as_mut() {
                    if carousel.in_track(&self.dom, target) {
                        carousel.touch_end(&mut self.dom, x);
                    }
                }
            }
            PageEvent::Load => {
                if let Some(telemetry) = self.telemetry.as_mut() {
                    telemetry.on_load(&mut self.dom);
                }
            }
        }

        self.pump();
        outcome
    }

    fn init(&mut self, now: Duration) {
        if self.ready {
            debug!("DOM ready delivered twice, ignoring");
            return;
        }
        self.ready = true;

        if !self.dom.prefers_reduced_motion() {
            if self.config.reveal.enabled {
                self.reveal = bind_or_disable(
                    "Reveal observer",
                    RevealObserver::bind(&mut self.dom, &self.config.reveal),
                );
            }
            let animator: Option<&mut dyn Animator> = match &mut self.animator {
                Some(animator) => Some(&mut **animator),
                None => None,
            };
            if let Err(e) = self.entrance.run(&mut self.dom, animator, now) {
                warn!("Entrance sequence disabled: {}", e);
            }
        }

        self.feedback = bind_or_disable(
            "Interaction feedback",
            InteractionFeedback::bind(&self.dom, &self.config.feedback).map(Some),
        );
        self.progress = ScrollProgress::bind(&self.dom, &self.config.progress);
        self.carousel = bind_or_disable(
            "Carousel",
            Carousel::bind(&mut self.dom, &self.config.carousel),
        );
        self.faq = bind_or_disable(
            "FAQ accordion",
            FaqAccordion::bind(&mut self.dom, &self.config.faq),
        );
        self.sticky_cta = StickyCta::bind(&mut self.dom, &self.config.sticky_cta);
        if self.config.telemetry.enabled {
            self.telemetry = Some(LoadTelemetry::new());
        }

        info!("Page ready: {}", self.active_components().join(", "));
    }

    /// Run every click binding on the bubble path; returns whether any
    /// of them cancelled the default action
    fn on_click(&mut self, target: ElementId, now: Duration) -> bool {
        let mut prevented = false;
        let mut current = Some(target);

        while let Some(el) = current {
            if let Some(feedback) = self.feedback.as_mut() {
                if feedback.is_anchor(el) {
                    prevented = true;
                    feedback.anchor_click(&mut self.dom, el);
                }
                if feedback.is_cta(el) {
                    prevented = true;
                    let delay = feedback.cta_click(&mut self.dom, el);
                    self.timers.schedule(now, delay, Task::RestoreCta(el));
                }
            }
            if let Some(carousel) = self.carousel.as_mut() {
                carousel.handle_click(&mut self.dom, el);
            }
            if let Some(faq) = self.faq.as_mut() {
                faq.handle_click(&mut self.dom, el);
            }
            current = self.dom.parent(el);
        }
        prevented
    }

    /// Route queued observer callbacks to their components
    pub fn pump(&mut self) {
        for observation in self.dom.take_observations() {
            match observation {
                Observation::Intersection {
                    key: ObserverKey::Reveal,
                    entries,
                } => {
                    if let Some(reveal) = self.reveal.as_mut() {
                        reveal.on_entries(&mut self.dom, &entries);
                    }
                }
                Observation::Intersection {
                    key: ObserverKey::StickyCta,
                    entries,
                } => {
                    if let Some(sticky) = self.sticky_cta.as_mut() {
                        sticky.on_entries(&mut self.dom, &entries);
                    }
                }
                Observation::Resize {
                    key: ObserverKey::Carousel,
                    target,
                } => {
                    if let Some(carousel) = self.carousel.as_mut() {
                        if carousel.root() == target {
                            carousel.on_resize(&mut self.dom);
                        }
                    }
                }
                other => trace!(?other, "Unrouted observation"),
            }
        }
    }

    /// Run timers due at `now`; returns how many fired
    pub fn fire_due(&mut self, now: Duration) -> usize {
        let due = self.timers.pop_due(now);
        let fired = due.len();
        for task in due {
            match task {
                Task::RestoreCta(button) => {
                    if let Some(feedback) = self.feedback.as_mut() {
                        feedback.restore(&mut self.dom, button);
                    }
                }
            }
        }
        if fired > 0 {
            self.pump();
        }
        fired
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Advance running animations; returns whether more frames are needed
    pub fn frame(&mut self, now: Duration) -> bool {
        let active = match self.animator.as_mut() {
            Some(animator) => animator.frame(&mut self.dom, now),
            None => false,
        };
        self.pump();
        active
    }

    pub fn is_animating(&self) -> bool {
        self.animator.as_ref().is_some_and(|animator| animator.is_active())
    }

    /// Names of the components bound at DOM ready
    pub fn active_components(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.reveal.is_some() {
            names.push("reveal");
        }
        if self.entrance.played() {
            names.push("entrance");
        }
        if self.feedback.is_some() {
            names.push("feedback");
        }
        if self.progress.is_some() {
            names.push("progress");
        }
        if self.carousel.is_some() {
            names.push("carousel");
        }
        if self.faq.is_some() {
            names.push("faq");
        }
        if self.sticky_cta.is_some() {
            names.push("sticky_cta");
        }
        if self.telemetry.is_some() {
            names.push("telemetry");
        }
        names
    }

    pub fn revealed(&self) -> usize {
        self.reveal.as_ref().map(RevealObserver::revealed).unwrap_or(0)
    }

    pub fn entrance_played(&self) -> bool {
        self.entrance.played()
    }

    pub fn carousel_index(&self) -> Option<usize> {
        self.carousel.as_ref().map(Carousel::current)
    }

    pub fn faq_open(&self) -> Option<usize> {
        self.faq.as_ref().and_then(FaqAccordion::open)
    }

    pub fn cta_visible(&self) -> Option<bool> {
        self.sticky_cta.as_ref().map(|sticky| sticky.is_visible(&self.dom))
    }

    pub fn progress_percent(&self) -> Option<f64> {
        self.progress.as_ref().map(ScrollProgress::percent)
    }

    pub fn load_ms(&self) -> Option<u64> {
        self.telemetry.as_ref().and_then(LoadTelemetry::reported)
    }

    pub fn pending_ctas(&self) -> usize {
        self.feedback.as_ref().map(InteractionFeedback::pending).unwrap_or(0)
    }
}
