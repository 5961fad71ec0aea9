//! [`Dom`] over the live browser document

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Array, Object, WeakMap};
use landkit_core::dom::{
    IntersectionEntry, LoadTiming, Observation, ObserverKey, ObserverOptions, ScrollBehavior,
    ScrollMetrics,
};
use landkit_core::{Dom, ElementId, Error, Result};
use tracing::{trace, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, ResizeObserver, ResizeObserverEntry, ScrollIntoViewOptions,
    ScrollLogicalPosition, Window,
};

/// Interned elements between sweeps of detached nodes
const SWEEP_EVERY: usize = 256;

/// Index slots; a released index is never handed out again
#[derive(Debug)]
struct Slots<T> {
    items: Vec<Option<T>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Slots<T> {
    fn insert(&mut self, item: T) -> usize {
        self.items.push(Some(item));
        self.items.len() - 1
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)?.as_ref()
    }

    /// Refill a released slot; returns whether it was empty
    fn restore(&mut self, index: usize, item: T) -> bool {
        match self.items.get_mut(index) {
            Some(slot @ None) => {
                *slot = Some(item);
                true
            }
            _ => false,
        }
    }

    /// Drop every item `release` selects, returning how many went
    fn release_where(&mut self, mut release: impl FnMut(&T) -> bool) -> usize {
        let mut released = 0;
        for slot in &mut self.items {
            if slot.as_ref().is_some_and(&mut release) {
                *slot = None;
                released += 1;
            }
        }
        released
    }

    fn live(&self) -> usize {
        self.items.iter().filter(|slot| slot.is_some()).count()
    }
}

struct ArenaInner {
    slots: Slots<Element>,
    /// Element -> slot index, without keeping the element alive
    index: WeakMap,
    since_sweep: usize,
}

/// Elements handed out as [`ElementId`]s, identified by JS identity
#[derive(Clone)]
pub(crate) struct Arena(Rc<RefCell<ArenaInner>>);

impl Arena {
    fn new() -> Self {
        Self(Rc::new(RefCell::new(ArenaInner {
            slots: Slots::default(),
            index: WeakMap::new(),
            since_sweep: 0,
        })))
    }

    pub(crate) fn intern(&self, el: &Element) -> ElementId {
        let mut inner = self.0.borrow_mut();
        if inner.since_sweep >= SWEEP_EVERY {
            inner.since_sweep = 0;
            // Detached nodes (replaced labels, removed markup) become collectable
            let released = inner.slots.release_where(|known| !known.is_connected());
            trace!(released, live = inner.slots.live(), "Swept element arena");
        }

        let key: &Object = el.unchecked_ref();
        let index = match inner.index.get(key).as_f64() {
            Some(index) => {
                let index = index as usize;
                inner.slots.restore(index, el.clone());
                index
            }
            None => {
                let index = inner.slots.insert(el.clone());
                inner.index.set(key, &JsValue::from_f64(index as f64));
                inner.since_sweep += 1;
                index
            }
        };
        ElementId(index as u32)
    }

    fn get(&self, id: ElementId) -> Option<Element> {
        self.0.borrow().slots.get(id.index()).cloned()
    }
}

type Queue = Rc<RefCell<Vec<Observation>>>;

struct IntersectionWatcher {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array)>,
}

struct ResizeWatcher {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut(Array)>,
}

/// `parseFloat` semantics: leading number, anything else is 0
fn parse_css_px(value: &str) -> f64 {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    value[..end].parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub struct WebDom {
    window: Window,
    document: Document,
    arena: Arena,
    queue: Queue,
    /// Called after an observer queued entries
    notify: Rc<dyn Fn()>,
    intersections: HashMap<ObserverKey, IntersectionWatcher>,
    resizes: HashMap<ObserverKey, ResizeWatcher>,
}

impl WebDom {
    pub fn new(window: Window, document: Document, notify: Rc<dyn Fn()>) -> Self {
        Self {
            window,
            document,
            arena: Arena::new(),
            queue: Rc::default(),
            notify,
            intersections: HashMap::new(),
            resizes: HashMap::new(),
        }
    }

    /// Handle for an element received from an event
    pub fn intern(&self, el: &Element) -> ElementId {
        self.arena.intern(el)
    }

    fn element(&self, id: ElementId) -> Option<Element> {
        self.arena.get(id)
    }

    fn html_element(&self, id: ElementId) -> Option<HtmlElement> {
        self.element(id)?.dyn_into::<HtmlElement>().ok()
    }

    fn collect(&self, list: std::result::Result<web_sys::NodeList, JsValue>, selector: &str) -> Result<Vec<ElementId>> {
        let list = list.map_err(|e| Error::Selector {
            selector: selector.to_string(),
            reason: e.as_string().unwrap_or_else(|| format!("{:?}", e)),
        })?;
        Ok((0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|el| self.arena.intern(&el))
            .collect())
    }

    fn intersection_watcher(&mut self, key: ObserverKey, options: &ObserverOptions) -> Option<&IntersectionWatcher> {
        if !self.intersections.contains_key(&key) {
            let arena = self.arena.clone();
            let queue = self.queue.clone();
            let notify = self.notify.clone();
            let callback = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
                let entries: Vec<IntersectionEntry> = entries
                    .iter()
                    .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                    .map(|entry| IntersectionEntry {
                        target: arena.intern(&entry.target()),
                        ratio: entry.intersection_ratio(),
                        is_intersecting: entry.is_intersecting(),
                    })
                    .collect();
                queue.borrow_mut().push(Observation::Intersection { key, entries });
                notify();
            });

            let init = IntersectionObserverInit::new();
            init.set_threshold(&JsValue::from_f64(options.threshold));
            init.set_root_margin(&options.root_margin.to_string());
            let observer = match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
                Ok(observer) => observer,
                Err(e) => {
                    warn!("IntersectionObserver unavailable: {:?}", e);
                    return None;
                }
            };
            self.intersections.insert(
                key,
                IntersectionWatcher {
                    observer,
                    _callback: callback,
                },
            );
        }
        self.intersections.get(&key)
    }

    fn resize_watcher(&mut self, key: ObserverKey) -> Option<&ResizeWatcher> {
        if !self.resizes.contains_key(&key) {
            let arena = self.arena.clone();
            let queue = self.queue.clone();
            let notify = self.notify.clone();
            let callback = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
                let mut queue = queue.borrow_mut();
                for entry in entries.iter().filter_map(|e| e.dyn_into::<ResizeObserverEntry>().ok()) {
                    queue.push(Observation::Resize {
                        key,
                        target: arena.intern(&entry.target()),
                    });
                }
                drop(queue);
                notify();
            });
            let observer = match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
                Ok(observer) => observer,
                Err(e) => {
                    warn!("ResizeObserver unavailable: {:?}", e);
                    return None;
                }
            };
            self.resizes.insert(
                key,
                ResizeWatcher {
                    observer,
                    _callback: callback,
                },
            );
        }
        self.resizes.get(&key)
    }
}

impl Dom for WebDom {
    fn query_all(&self, selector: &str) -> Result<Vec<ElementId>> {
        self.collect(self.document.query_selector_all(selector), selector)
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Result<Vec<ElementId>> {
        let Some(root) = self.element(root) else {
            return Ok(Vec::new());
        };
        self.collect(root.query_selector_all(selector), selector)
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.document
            .get_element_by_id(id)
            .map(|el| self.arena.intern(&el))
    }

    fn children(&self, el: ElementId) -> Vec<ElementId> {
        let Some(el) = self.element(el) else {
            return Vec::new();
        };
        let children = el.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .map(|child| self.arena.intern(&child))
            .collect()
    }

    fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.element(el)?
            .parent_element()
            .map(|parent| self.arena.intern(&parent))
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.element(el)
            .is_some_and(|el| el.class_list().contains(class))
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        if let Some(el) = self.element(el) {
            if let Err(e) = el.class_list().add_1(class) {
                warn!("classList.add('{}') failed: {:?}", class, e);
            }
        }
    }

    fn remove_class(&mut self, el: ElementId, class: &str) {
        if let Some(el) = self.element(el) {
            if let Err(e) = el.class_list().remove_1(class) {
                warn!("classList.remove('{}') failed: {:?}", class, e);
            }
        }
    }

    fn toggle_class(&mut self, el: ElementId, class: &str, force: Option<bool>) -> bool {
        let Some(el) = self.element(el) else {
            return false;
        };
        let list = el.class_list();
        let result = match force {
            Some(force) => list.toggle_with_force(class, force),
            None => list.toggle(class),
        };
        result.unwrap_or(false)
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.element(el)?.get_attribute(name)
    }

    fn inner_html(&self, el: ElementId) -> String {
        self.element(el).map(|el| el.inner_html()).unwrap_or_default()
    }

    fn set_inner_html(&mut self, el: ElementId, html: &str) {
        if let Some(el) = self.element(el) {
            el.set_inner_html(html);
        }
    }

    fn style(&self, el: ElementId, property: &str) -> Option<String> {
        self.html_element(el)?
            .style()
            .get_property_value(property)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        let Some(el) = self.html_element(el) else {
            return;
        };
        let style = el.style();
        let result = if value.is_empty() {
            style.remove_property(property).map(|_| ())
        } else {
            style.set_property(property, value)
        };
        if let Err(e) = result {
            warn!("Setting style '{}' failed: {:?}", property, e);
        }
    }

    fn computed_gap(&self, el: ElementId) -> f64 {
        self.element(el)
            .and_then(|el| self.window.get_computed_style(&el).ok().flatten())
            .and_then(|style| style.get_property_value("gap").ok())
            .map(|gap| parse_css_px(&gap))
            .unwrap_or(0.0)
    }

    fn bounding_width(&self, el: ElementId) -> f64 {
        self.element(el)
            .map(|el| el.get_bounding_client_rect().width())
            .unwrap_or(0.0)
    }

    fn force_reflow(&mut self, el: ElementId) {
        if let Some(el) = self.html_element(el) {
            // Reading layout flushes pending style changes
            let _ = el.offset_height();
        }
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.window.scroll_y().unwrap_or(0.0),
            document_height: self
                .document
                .document_element()
                .map(|root| root.scroll_height() as f64)
                .unwrap_or(0.0),
            viewport_height: self
                .window
                .inner_height()
                .ok()
                .and_then(|h| h.as_f64())
                .unwrap_or(0.0),
        }
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.window
            .match_media("(prefers-reduced-motion: reduce)")
            .ok()
            .flatten()
            .is_some_and(|query| query.matches())
    }

    fn scroll_into_view(&mut self, el: ElementId, behavior: ScrollBehavior) {
        let Some(el) = self.element(el) else {
            return;
        };
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(match behavior {
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
        });
        options.set_block(ScrollLogicalPosition::Start);
        el.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn alert(&mut self, message: &str) {
        if let Err(e) = self.window.alert_with_message(message) {
            warn!("alert failed: {:?}", e);
        }
    }

    fn console_log(&mut self, line: &str) {
        web_sys::console::log_1(&JsValue::from_str(line));
    }

    fn load_timing(&self) -> Option<LoadTiming> {
        let performance = self.window.performance()?;
        let timing = performance.timing();
        Some(LoadTiming {
            navigation_start_ms: timing.navigation_start(),
            load_event_end_ms: timing.load_event_end(),
            elapsed_since_navigation_ms: performance.now(),
        })
    }

    fn observe_intersection(&mut self, key: ObserverKey, el: ElementId, options: &ObserverOptions) {
        let Some(target) = self.element(el) else {
            return;
        };
        if let Some(watcher) = self.intersection_watcher(key, options) {
            watcher.observer.observe(&target);
        }
    }

    fn unobserve_intersection(&mut self, key: ObserverKey, el: ElementId) {
        if let (Some(watcher), Some(target)) = (self.intersections.get(&key), self.element(el)) {
            watcher.observer.unobserve(&target);
        }
    }

    fn observe_resize(&mut self, key: ObserverKey, el: ElementId) {
        let Some(target) = self.element(el) else {
            return;
        };
        if let Some(watcher) = self.resize_watcher(key) {
            watcher.observer.observe(&target);
        }
    }

    fn take_observations(&mut self) -> Vec<Observation> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_css_px() {
        assert_eq!(parse_css_px("24px"), 24.0);
        assert_eq!(parse_css_px(" 1.5rem"), 1.5);
        assert_eq!(parse_css_px("normal"), 0.0);
        assert_eq!(parse_css_px(""), 0.0);
        assert_eq!(parse_css_px("-8px"), -8.0);
    }

    #[test]
    fn test_slots_release_without_reuse() {
        let mut slots = Slots::default();
        let button = slots.insert("button");
        let spinner = slots.insert("spinner");
        assert_eq!((button, spinner), (0, 1));

        assert_eq!(slots.release_where(|item| *item == "spinner"), 1);
        assert_eq!(slots.get(spinner), None);
        assert_eq!(slots.get(button), Some(&"button"));
        assert_eq!(slots.live(), 1);

        // Released indices stay retired so stale handles resolve to nothing
        assert_eq!(slots.insert("label"), 2);
    }

    #[test]
    fn test_slots_restore_only_fills_released() {
        let mut slots = Slots::default();
        let card = slots.insert("card");
        assert!(!slots.restore(card, "other"));
        assert_eq!(slots.get(card), Some(&"card"));

        slots.release_where(|_| true);
        assert!(slots.restore(card, "card"));
        assert_eq!(slots.get(card), Some(&"card"));
        assert!(!slots.restore(7, "missing"));
    }
}
