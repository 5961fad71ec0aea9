//! Motion primitives shared by the components
//!
//! The page does not animate itself in a browser: scrolling is native and the
//! entrance runs on GSAP. Everything here beyond the easing names exists so
//! the in-memory page can replay and test those motions.
//!
//! - `easing` - pure easing curves (GSAP and CSS names)
//! - `timing` - progress and interpolation helpers on the page clock
//! - `scroll` - smooth scroll controller for the in-memory page
//! - `tween` - timelines and the [`Animator`] capability

pub mod easing;
pub mod scroll;
pub mod timing;
pub mod tween;

pub use easing::EasingType;
pub use scroll::ScrollAnimator;
pub use tween::{Animator, Position, Slot, Timeline, Tween, TweenAnimator, TweenFrom};
