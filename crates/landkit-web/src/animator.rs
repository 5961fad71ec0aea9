//! GSAP-backed [`Animator`]

use std::time::Duration;

use js_sys::{Object, Reflect};
use landkit_core::motion::{Position, Timeline};
use landkit_core::{Animator, Dom, EasingType};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    /// The global `gsap` object
    pub type Gsap;

    #[wasm_bindgen(method)]
    fn timeline(this: &Gsap, vars: &JsValue) -> GsapTimeline;

    pub type GsapTimeline;

    #[wasm_bindgen(method)]
    fn from(this: &GsapTimeline, targets: &str, vars: &JsValue, position: &JsValue) -> GsapTimeline;
}

/// GSAP name for an easing curve
fn gsap_ease(ease: EasingType) -> String {
    match ease {
        EasingType::None => "steps(1)".to_string(),
        EasingType::Linear => "none".to_string(),
        // Arbitrary beziers need the CustomEase plugin
        EasingType::CubicBezier(..) => "power2.out".to_string(),
        other => other.to_string(),
    }
}

/// GSAP position parameter for a tween
#[derive(Debug, Clone, PartialEq)]
enum GsapPosition {
    /// Omitted: append at the end of the timeline
    Default,
    Relative(String),
    Absolute(f64),
}

impl GsapPosition {
    fn to_js(&self) -> JsValue {
        match self {
            GsapPosition::Default => JsValue::UNDEFINED,
            GsapPosition::Relative(relative) => JsValue::from_str(relative),
            GsapPosition::Absolute(at) => JsValue::from_f64(*at),
        }
    }
}

fn gsap_position(position: Position) -> GsapPosition {
    match position {
        Position::Sequential => GsapPosition::Default,
        Position::Offset(offset) if offset < 0.0 => GsapPosition::Relative(format!("-={}", -offset)),
        Position::Offset(offset) => GsapPosition::Relative(format!("+={}", offset)),
        Position::At(at) => GsapPosition::Absolute(at),
    }
}

fn vars(entries: &[(&str, JsValue)]) -> Result<JsValue, JsValue> {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value)?;
    }
    Ok(object.into())
}

pub struct GsapAnimator {
    gsap: Gsap,
}

impl GsapAnimator {
    /// Look up `globalThis.gsap` once; `None` when the library is not loaded
    pub fn detect() -> Option<Self> {
        let gsap = Reflect::get(&js_sys::global(), &JsValue::from_str("gsap")).ok()?;
        if gsap.is_undefined() || gsap.is_null() {
            debug!("GSAP not present");
            return None;
        }
        Some(Self {
            gsap: gsap.unchecked_into(),
        })
    }

    fn build(&self, timeline: &Timeline) -> Result<(), JsValue> {
        let mut gsap_timeline = self
            .gsap
            .timeline(&vars(&[("delay", JsValue::from_f64(timeline.delay))])?);
        for tween in &timeline.tweens {
            let tween_vars = vars(&[
                ("y", JsValue::from_f64(tween.from.y)),
                ("opacity", JsValue::from_f64(tween.from.opacity)),
                ("duration", JsValue::from_f64(tween.duration)),
                ("ease", JsValue::from_str(&gsap_ease(tween.ease))),
            ])?;
            gsap_timeline = gsap_timeline.from(&tween.target, &tween_vars, &gsap_position(tween.position).to_js());
        }
        Ok(())
    }
}

impl Animator for GsapAnimator {
    // GSAP drives its own frames and selects targets itself
    fn play(&mut self, _dom: &mut dyn Dom, timeline: &Timeline, _now: Duration) {
        if let Err(e) = self.build(timeline) {
            warn!("GSAP timeline failed: {:?}", e);
        }
    }
}
