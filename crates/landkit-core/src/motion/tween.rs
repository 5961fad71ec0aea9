//! Timelines of `from` tweens and the animation capability seam
//!
//! A [`Timeline`] describes what should move and when; an [`Animator`]
//! makes it happen. In the browser that is GSAP. [`TweenAnimator`] exists
//! only for headless replay and tests: it writes interpolated inline styles
//! so a session can observe the entrance, and is never used in a browser.

use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::dom::{css_number, Dom, ElementId};

use super::easing::EasingType;
use super::timing::{is_complete, lerp, progress, secs};

/// GSAP-style position parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// Start when the timeline currently ends
    Sequential,
    /// Relative to the current end, e.g. `-=0.8`
    Offset(f64),
    /// Absolute time in seconds
    At(f64),
}

impl FromStr for Position {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || crate::Error::Config(format!("invalid timeline position '{}'", s));
        if s.is_empty() {
            return Ok(Position::Sequential);
        }
        let parse = |v: &str| v.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        if let Some(rest) = s.strip_prefix("-=") {
            parse(rest).map(|v| Position::Offset(-v)).ok_or_else(invalid)
        } else if let Some(rest) = s.strip_prefix("+=") {
            parse(rest).map(Position::Offset).ok_or_else(invalid)
        } else {
            parse(s).map(Position::At).ok_or_else(invalid)
        }
    }
}

/// Starting values a `from` tween animates away from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenFrom {
    /// Vertical offset in pixels
    pub y: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    /// CSS selector of the animated elements
    pub target: String,
    pub from: TweenFrom,
    /// Seconds
    pub duration: f64,
    pub ease: EasingType,
    pub position: Position,
}

/// Absolute start and end of a tween, in seconds from `play`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    /// Seconds before the first tween may start
    pub delay: f64,
    pub tweens: Vec<Tween>,
}

impl Timeline {
    pub fn new(delay: f64) -> Self {
        Self {
            delay: delay.max(0.0),
            tweens: Vec::new(),
        }
    }

    /// Append a tween (builder style, like `gsap.timeline().from(...)`)
    pub fn from(mut self, tween: Tween) -> Self {
        self.tweens.push(tween);
        self
    }

    /// Resolve every tween's position into absolute times
    pub fn schedule(&self) -> Vec<Slot> {
        let mut end_of_timeline: f64 = 0.0;
        self.tweens
            .iter()
            .map(|tween| {
                let start = match tween.position {
                    Position::Sequential => end_of_timeline,
                    Position::Offset(offset) => (end_of_timeline + offset).max(0.0),
                    Position::At(at) => at.max(0.0),
                };
                let end = start + tween.duration.max(0.0);
                end_of_timeline = end_of_timeline.max(end);
                Slot {
                    start: self.delay + start,
                    end: self.delay + end,
                }
            })
            .collect()
    }

    /// Seconds from `play` until the last tween ends
    pub fn total_duration(&self) -> f64 {
        self.schedule()
            .iter()
            .map(|slot| slot.end)
            .fold(self.delay, f64::max)
    }
}

/// Optional animation capability injected into the page
pub trait Animator {
    /// Start playing `timeline` at page time `now`
    fn play(&mut self, dom: &mut dyn Dom, timeline: &Timeline, now: Duration);

    /// Advance running tweens; returns whether anything is still animating
    fn frame(&mut self, _dom: &mut dyn Dom, _now: Duration) -> bool {
        false
    }

    /// Whether frames are needed
    fn is_active(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct ActiveTween {
    el: ElementId,
    from: TweenFrom,
    start: Duration,
    duration: Duration,
    ease: EasingType,
}

/// Headless animator that writes `opacity` and `transform` inline styles
#[derive(Debug, Clone, Default)]
pub struct TweenAnimator {
    active: Vec<ActiveTween>,
    played: usize,
}

impl TweenAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timelines played so far
    pub fn played(&self) -> usize {
        self.played
    }

    fn render(dom: &mut dyn Dom, el: ElementId, y: f64, opacity: f64) {
        dom.set_style(el, "opacity", &css_number(opacity));
        dom.set_style(el, "transform", &format!("translateY({}px)", css_number(y)));
    }

    /// `from` tweens end at the natural state: drop the inline overrides
    fn settle(dom: &mut dyn Dom, el: ElementId) {
        dom.set_style(el, "opacity", "");
        dom.set_style(el, "transform", "");
    }
}

impl Animator for TweenAnimator {
    fn play(&mut self, dom: &mut dyn Dom, timeline: &Timeline, now: Duration) {
        self.played += 1;
        for (tween, slot) in timeline.tweens.iter().zip(timeline.schedule()) {
            let targets = match dom.query_all(&tween.target) {
                Ok(targets) => targets,
                Err(e) => {
                    debug!("Skipping tween for '{}': {}", tween.target, e);
                    continue;
                }
            };
            for el in targets {
                // `from` tweens render their starting state immediately
                Self::render(dom, el, tween.from.y, tween.from.opacity);
                self.active.push(ActiveTween {
                    el,
                    from: tween.from,
                    start: now + secs(slot.start),
                    duration: secs(slot.end - slot.start),
                    ease: tween.ease,
                });
            }
        }
    }

    fn frame(&mut self, dom: &mut dyn Dom, now: Duration) -> bool {
        self.active.retain(|tween| {
            if now < tween.start {
                return true;
            }
            if is_complete(tween.start, now, tween.duration) {
                Self::settle(dom, tween.el);
                return false;
            }
            let t = progress(tween.start, now, tween.duration);
            let eased = tween.ease.apply(t);
            Self::render(
                dom,
                tween.el,
                lerp(tween.from.y, 0.0, eased),
                lerp(tween.from.opacity, 1.0, eased),
            );
            true
        });
        !self.active.is_empty()
    }

    fn is_active(&self) -> bool {
        !self.active.is_empty()
    }
}
