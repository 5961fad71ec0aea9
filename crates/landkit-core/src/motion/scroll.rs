//! Smooth scroll controller
//!
//! Combines easing functions and timing utilities to animate the window
//! scroll position. Browsers scroll natively; this drives the in-memory
//! page so smooth anchor navigation can be replayed and tested.

use std::time::Duration;

use crate::config::ScrollConfig;

use super::easing::EasingType;
use super::timing::{is_complete, lerp, progress};

/// Active scroll animation state
#[derive(Debug, Clone)]
struct ActiveAnimation {
    /// Animation start time
    start: Duration,
    /// Starting scroll position
    from: f64,
    /// Target scroll position
    to: f64,
    /// Animation duration
    duration: Duration,
    /// Easing function
    easing: EasingType,
}

/// Scroll animation controller
///
/// Call `scroll_to()` to begin an animation, then `update()` each frame
/// to get the current interpolated scroll position.
#[derive(Debug, Clone, Default)]
pub struct ScrollAnimator {
    /// Current active animation (if any)
    animation: Option<ActiveAnimation>,
    /// Configuration
    config: ScrollConfig,
    /// Current scroll position (always up-to-date)
    position: f64,
}

impl ScrollAnimator {
    /// Create a new scroll animator with configuration
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            animation: None,
            config,
            position: 0.0,
        }
    }

    fn is_smooth(&self) -> bool {
        self.config.smooth_enabled && self.config.animation_duration_ms > 0
    }

    /// Check if an animation is currently active
    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Get the target scroll position (final position after animation)
    pub fn target(&self) -> f64 {
        self.animation
            .as_ref()
            .map(|a| a.to)
            .unwrap_or(self.position)
    }

    /// Get the current interpolated scroll position
    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Set scroll position immediately (no animation)
    pub fn set_position(&mut self, position: f64) {
        self.animation = None;
        self.position = position;
    }

    /// Start a scroll animation to a target position
    ///
    /// If smooth scrolling is disabled, jumps immediately to target.
    /// A new target replaces any animation in progress, starting from the
    /// currently visible position.
    pub fn scroll_to(&mut self, target: f64, max_scroll: f64, now: Duration) {
        let target = target.clamp(0.0, max_scroll.max(0.0));

        if !self.is_smooth() {
            self.set_position(target);
            return;
        }

        let from = self.position;

        // Skip animation if already at target
        if (from - target).abs() < f64::EPSILON {
            self.animation = None;
            return;
        }

        self.animation = Some(ActiveAnimation {
            start: now,
            from,
            to: target,
            duration: Duration::from_millis(self.config.animation_duration_ms),
            easing: self.config.easing,
        });
    }

    /// Advance the animation and return the current scroll position
    pub fn update(&mut self, now: Duration) -> f64 {
        if let Some(ref anim) = self.animation {
            if is_complete(anim.start, now, anim.duration) {
                self.position = anim.to;
                self.animation = None;
            } else {
                let t = progress(anim.start, now, anim.duration);
                self.position = lerp(anim.from, anim.to, anim.easing.apply(t));
            }
        }

        self.position
    }

    /// Cancel any active animation and stop at current position
    pub fn cancel(&mut self) {
        self.animation = None;
    }
}
