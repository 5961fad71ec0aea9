//! Page instance, browser listeners and timers

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use landkit_core::{AppConfig, Dispatch, Page, PageEvent};
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Element, Event, EventTarget, TouchEvent};

use crate::animator::GsapAnimator;
use crate::dom::WebDom;

thread_local! {
    static PAGE: RefCell<Option<Page<WebDom>>> = const { RefCell::new(None) };
    /// Deadline the pending `setTimeout` was armed for
    static ARMED: Cell<Option<Duration>> = const { Cell::new(None) };
}

/// Page clock: high resolution time since navigation start
fn now() -> Duration {
    let ms = web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or(0.0);
    Duration::from_secs_f64((ms / 1000.0).max(0.0))
}

fn with_page<R>(f: impl FnOnce(&mut Page<WebDom>) -> R) -> Option<R> {
    PAGE.with(|page| {
        // Re-entrant callbacks are picked up by the outer dispatch
        let mut page = page.try_borrow_mut().ok()?;
        page.as_mut().map(f)
    })
}

fn dispatch(event: PageEvent) -> Dispatch {
    let outcome = with_page(|page| page.dispatch(event, now())).unwrap_or_default();
    arm_timer();
    outcome
}

/// Route observer callbacks queued outside a dispatch
fn pump() {
    with_page(|page| page.pump());
    arm_timer();
}

fn fire_timers() {
    ARMED.with(|armed| armed.set(None));
    with_page(|page| page.fire_due(now()));
    arm_timer();
}

/// Make sure a `setTimeout` is pending for the earliest page timer
fn arm_timer() {
    let Some(deadline) = with_page(|page| page.next_deadline()).flatten() else {
        return;
    };
    let already_armed = ARMED.with(|armed| armed.get().is_some_and(|at| at <= deadline));
    if already_armed {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };

    let delay = deadline.saturating_sub(now()).as_millis().min(i32::MAX as u128) as i32;
    let callback = Closure::once_into_js(fire_timers);
    match window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay) {
        Ok(_) => ARMED.with(|armed| armed.set(Some(deadline))),
        Err(e) => warn!("setTimeout failed: {:?}", e),
    }
}

fn listen(
    target: &EventTarget,
    kind: &str,
    passive: bool,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let callback = Closure::<dyn FnMut(Event)>::new(handler);
    let options = AddEventListenerOptions::new();
    options.set_passive(passive);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        callback.as_ref().unchecked_ref(),
        &options,
    )?;
    // Listeners live as long as the page
    callback.forget();
    Ok(())
}

fn event_target(event: &Event) -> Option<landkit_core::ElementId> {
    let element = event.target()?.dyn_into::<Element>().ok()?;
    with_page(|page| page.dom().intern(&element))
}

fn touch_x(event: &Event, ended: bool) -> Option<f64> {
    let touch_event = event.dyn_ref::<TouchEvent>()?;
    let touches = if ended {
        touch_event.changed_touches()
    } else {
        touch_event.touches()
    };
    touches.get(0).map(|touch| touch.client_x() as f64)
}

fn install_listeners(window: &web_sys::Window, document: &web_sys::Document) -> Result<(), JsValue> {
    listen(document, "click", false, |event| {
        if let Some(target) = event_target(&event) {
            if dispatch(PageEvent::Click { target }).default_prevented {
                event.prevent_default();
            }
        }
    })?;
    listen(document, "touchstart", true, |event| {
        if let (Some(target), Some(x)) = (event_target(&event), touch_x(&event, false)) {
            dispatch(PageEvent::TouchStart { target, x });
        }
    })?;
    listen(document, "touchend", true, |event| {
        if let (Some(target), Some(x)) = (event_target(&event), touch_x(&event, true)) {
            dispatch(PageEvent::TouchEnd { target, x });
        }
    })?;
    listen(window, "scroll", true, |_| {
        dispatch(PageEvent::Scroll);
    })?;
    Ok(())
}

/// How far the document got before the module was instantiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Loading,
    /// `interactive`: parsed, subresources still loading
    Parsed,
    /// `complete`: the window `load` event already fired
    Loaded,
}

impl Readiness {
    fn from_ready_state(state: &str) -> Self {
        match state {
            "loading" => Readiness::Loading,
            "complete" => Readiness::Loaded,
            _ => Readiness::Parsed,
        }
    }

    /// `DomReady` can be dispatched right away
    fn dom_ready(self) -> bool {
        self != Readiness::Loading
    }

    /// `Load` can be dispatched right away
    fn loaded(self) -> bool {
        self == Readiness::Loaded
    }
}

pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let dom = WebDom::new(window.clone(), document.clone(), Rc::new(pump));
    let mut page = Page::new(dom, AppConfig::default());
    if let Some(gsap) = GsapAnimator::detect() {
        page = page.with_animator(Box::new(gsap));
    }
    PAGE.with(|slot| *slot.borrow_mut() = Some(page));

    install_listeners(&window, &document)?;

    let readiness = Readiness::from_ready_state(&document.ready_state());
    if readiness.dom_ready() {
        dispatch(PageEvent::DomReady);
    } else {
        listen(&document, "DOMContentLoaded", false, |_| {
            dispatch(PageEvent::DomReady);
        })?;
    }
    if readiness.loaded() {
        dispatch(PageEvent::Load);
    } else {
        listen(&window, "load", false, |_| {
            dispatch(PageEvent::Load);
        })?;
    }
    info!(?readiness, "landkit started");
    Ok(())
}
