//! In-memory page model
//!
//! Arena-allocated elements with classes, attributes, inline styles and a
//! static layout rectangle each, plus the window state the components read.
//! Intersection and resize observers are evaluated here against the layout,
//! so a whole session can be replayed without a browser.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::trace;

use crate::config::ScrollConfig;
use crate::motion::ScrollAnimator;
use crate::{Error, Result};

use super::geometry::{intersection_ratio, Rect};
use super::selector::{Selector, SelectorTree};
use super::{
    Dom, ElementId, IntersectionEntry, LoadTiming, Observation, ObserverKey, ObserverOptions,
    ScrollBehavior, ScrollMetrics,
};

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    html: String,
    rect: Rect,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// Element description used when building a page
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub styles: BTreeMap<String, String>,
    pub html: String,
    /// Inherits the parent's rectangle when absent
    pub rect: Option<Rect>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, classes: &str) -> Self {
        self.classes.extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Some(Rect::new(x, y, width, height));
        self
    }
}

#[derive(Debug, Clone)]
struct IntersectionWatch {
    key: ObserverKey,
    target: ElementId,
    options: ObserverOptions,
    /// Last delivered "meets threshold" state
    meets: bool,
}

#[derive(Debug, Clone)]
struct ResizeWatch {
    key: ObserverKey,
    target: ElementId,
    size: (f64, f64),
}

/// Headless [`Dom`] implementation
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    viewport: (f64, f64),
    scroll_y: f64,
    /// Explicit scroll height; derived from the layout when absent
    document_height: Option<f64>,
    reduced_motion: bool,
    load_timing: Option<LoadTiming>,
    clock: Duration,
    scroller: ScrollAnimator,
    scroll_dirty: bool,
    intersection_watches: Vec<IntersectionWatch>,
    resize_watches: Vec<ResizeWatch>,
    pending: Vec<Observation>,
    alerts: Vec<String>,
    console: Vec<String>,
    reflows: usize,
}

impl MemoryDom {
    /// Create an empty page with a `body` root element
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        let body = Node {
            tag: "body".to_string(),
            id: None,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            styles: BTreeMap::new(),
            html: String::new(),
            rect: Rect::new(0.0, 0.0, viewport_width, viewport_height),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            viewport: (viewport_width.max(0.0), viewport_height.max(0.0)),
            scroll_y: 0.0,
            document_height: None,
            reduced_motion: false,
            load_timing: None,
            clock: Duration::ZERO,
            scroller: ScrollAnimator::default(),
            scroll_dirty: false,
            intersection_watches: Vec::new(),
            resize_watches: Vec::new(),
            pending: Vec::new(),
            alerts: Vec::new(),
            console: Vec::new(),
            reflows: 0,
        }
    }

    /// The `body` element every page starts with
    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Append a child element and return its handle
    pub fn append(&mut self, parent: ElementId, spec: ElementSpec) -> Result<ElementId> {
        let parent_rect = self
            .nodes
            .get(parent.index())
            .map(|node| node.rect)
            .ok_or_else(|| Error::Fixture(format!("unknown parent element {}", parent)))?;
        if let Some(id) = &spec.id {
            if self.element_by_id(id).is_some() {
                return Err(Error::Fixture(format!("duplicate element id '{}'", id)));
            }
        }

        let el = ElementId(self.nodes.len() as u32);
        self.nodes.push(Node {
            tag: if spec.tag.is_empty() { "div".to_string() } else { spec.tag },
            id: spec.id,
            classes: dedup(spec.classes),
            attrs: spec.attrs,
            styles: spec.styles,
            html: spec.html,
            rect: spec.rect.unwrap_or(parent_rect),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(el);
        Ok(el)
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    pub fn set_load_timing(&mut self, timing: Option<LoadTiming>) {
        self.load_timing = timing;
    }

    pub fn set_document_height(&mut self, height: Option<f64>) {
        self.document_height = height;
        self.clamp_scroll();
        self.refresh_intersections();
    }

    pub fn set_scroll_config(&mut self, config: ScrollConfig) {
        self.scroller = ScrollAnimator::new(config);
        self.scroller.set_position(self.scroll_y);
    }

    /// Current page clock, used to start smooth scrolls
    pub fn set_clock(&mut self, now: Duration) {
        self.clock = now;
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    fn max_scroll(&self) -> f64 {
        (self.document_height() - self.viewport.1).max(0.0)
    }

    fn clamp_scroll(&mut self) {
        let clamped = self.scroll_y.clamp(0.0, self.max_scroll());
        if clamped != self.scroll_y {
            self.scroll_y = clamped;
            self.scroll_dirty = true;
        }
    }

    /// Scroll height: explicit, or the lowest element edge (never below the viewport)
    pub fn document_height(&self) -> f64 {
        self.document_height.unwrap_or_else(|| {
            self.nodes
                .iter()
                .skip(1)
                .map(|node| node.rect.bottom())
                .fold(self.viewport.1, f64::max)
        })
    }

    /// Jump to a scroll position (user scrolling), cancelling smooth scrolls
    pub fn set_scroll_y(&mut self, y: f64) {
        self.scroller.set_position(y);
        self.apply_scroll(y);
    }

    fn apply_scroll(&mut self, y: f64) {
        let y = y.clamp(0.0, self.max_scroll());
        if y != self.scroll_y {
            self.scroll_y = y;
            self.scroll_dirty = true;
            self.refresh_intersections();
        }
    }

    /// Advance an in-flight smooth scroll; returns whether the position moved
    pub fn advance_scroll(&mut self, now: Duration) -> bool {
        self.clock = now;
        if !self.scroller.is_animating() {
            return false;
        }
        let before = self.scroll_y;
        let position = self.scroller.update(now);
        self.apply_scroll(position);
        self.scroll_y != before
    }

    pub fn is_scrolling(&self) -> bool {
        self.scroller.is_animating()
    }

    /// Whether the position changed since the last call (a scroll event is due)
    pub fn take_scroll_dirty(&mut self) -> bool {
        std::mem::take(&mut self.scroll_dirty)
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width.max(0.0), height.max(0.0));
        self.clamp_scroll();
        self.refresh_intersections();
    }

    /// Change an element's size, notifying resize and intersection observers
    pub fn set_size(&mut self, el: ElementId, width: f64, height: f64) {
        let Some(node) = self.nodes.get_mut(el.index()) else {
            return;
        };
        node.rect = Rect::new(node.rect.x, node.rect.y, width, height);

        for watch in self.resize_watches.iter_mut().filter(|w| w.target == el) {
            if watch.size != (width, height) {
                watch.size = (width, height);
                self.pending.push(Observation::Resize {
                    key: watch.key,
                    target: el,
                });
            }
        }
        self.refresh_intersections();
    }

    pub fn rect(&self, el: ElementId) -> Option<Rect> {
        self.nodes.get(el.index()).map(|node| node.rect)
    }

    pub fn classes(&self, el: ElementId) -> &[String] {
        self.nodes
            .get(el.index())
            .map(|node| node.classes.as_slice())
            .unwrap_or(&[])
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn console(&self) -> &[String] {
        &self.console
    }

    pub fn reflow_count(&self) -> usize {
        self.reflows
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn viewport_rect(&self) -> Rect {
        Rect::new(0.0, self.scroll_y, self.viewport.0, self.viewport.1)
    }

    fn entry_for(&self, watch: &IntersectionWatch) -> IntersectionEntry {
        let root = self.viewport_rect().expand(&watch.options.root_margin);
        let target = self.nodes[watch.target.index()].rect;
        let (ratio, is_intersecting) = intersection_ratio(&target, &root);
        IntersectionEntry {
            target: watch.target,
            ratio,
            is_intersecting,
        }
    }

    /// Queue entries for every watch whose threshold state flipped
    fn refresh_intersections(&mut self) {
        let mut batches: BTreeMap<ObserverKey, Vec<IntersectionEntry>> = BTreeMap::new();

        for i in 0..self.intersection_watches.len() {
            let entry = self.entry_for(&self.intersection_watches[i]);
            let watch = &mut self.intersection_watches[i];
            let meets = entry.meets(watch.options.threshold);
            if meets != watch.meets {
                watch.meets = meets;
                batches.entry(watch.key).or_default().push(entry);
            }
        }

        for (key, entries) in batches {
            trace!(?key, count = entries.len(), "Intersection entries queued");
            self.pending.push(Observation::Intersection { key, entries });
        }
    }

    fn node(&self, el: ElementId) -> Option<&Node> {
        self.nodes.get(el.index())
    }

    fn node_mut(&mut self, el: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(el.index())
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self
            .node(root)
            .map(|node| node.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(el) = stack.pop() {
            out.push(el);
            if let Some(node) = self.node(el) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }
}

fn dedup(classes: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(classes.len());
    for class in classes {
        if !out.contains(&class) {
            out.push(class);
        }
    }
    out
}

impl SelectorTree for MemoryDom {
    fn node_tag(&self, el: ElementId) -> &str {
        self.node(el).map(|node| node.tag.as_str()).unwrap_or("")
    }

    fn node_id(&self, el: ElementId) -> Option<&str> {
        self.node(el).and_then(|node| node.id.as_deref())
    }

    fn node_has_class(&self, el: ElementId, class: &str) -> bool {
        self.node(el)
            .is_some_and(|node| node.classes.iter().any(|c| c == class))
    }

    fn node_attr(&self, el: ElementId, name: &str) -> Option<&str> {
        self.node(el).and_then(|node| match name {
            "id" => node.id.as_deref(),
            _ => node.attrs.get(name).map(String::as_str),
        })
    }

    fn node_parent(&self, el: ElementId) -> Option<ElementId> {
        self.node(el).and_then(|node| node.parent)
    }
}

impl Dom for MemoryDom {
    fn query_all(&self, selector: &str) -> Result<Vec<ElementId>> {
        let selector = Selector::parse(selector)?;
        // Document order, root included
        let mut candidates = vec![self.root()];
        candidates.extend(self.descendants(self.root()));
        Ok(candidates
            .into_iter()
            .filter(|&el| selector.matches(self, el))
            .collect())
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Result<Vec<ElementId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .filter(|&el| selector.matches(self, el))
            .collect())
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.nodes
            .iter()
            .position(|node| node.id.as_deref() == Some(id))
            .map(|index| ElementId(index as u32))
    }

    fn children(&self, el: ElementId) -> Vec<ElementId> {
        self.node(el).map(|node| node.children.clone()).unwrap_or_default()
    }

    fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.node_parent(el)
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.node_has_class(el, class)
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.node_mut(el) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.node_mut(el) {
            node.classes.retain(|c| c != class);
        }
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.node_attr(el, name).map(str::to_string)
    }

    fn inner_html(&self, el: ElementId) -> String {
        self.node(el).map(|node| node.html.clone()).unwrap_or_default()
    }

    fn set_inner_html(&mut self, el: ElementId, html: &str) {
        if let Some(node) = self.node_mut(el) {
            node.html = html.to_string();
        }
    }

    fn style(&self, el: ElementId, property: &str) -> Option<String> {
        self.node(el).and_then(|node| node.styles.get(property).cloned())
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) {
        if let Some(node) = self.node_mut(el) {
            if value.is_empty() {
                node.styles.remove(property);
            } else {
                node.styles.insert(property.to_string(), value.to_string());
            }
        }
    }

    fn computed_gap(&self, el: ElementId) -> f64 {
        self.node(el)
            .and_then(|node| node.styles.get("gap"))
            .and_then(|gap| {
                let gap = gap.trim();
                gap.strip_suffix("px").unwrap_or(gap).trim().parse::<f64>().ok()
            })
            .filter(|gap| gap.is_finite())
            .unwrap_or(0.0)
    }

    fn bounding_width(&self, el: ElementId) -> f64 {
        self.node(el).map(|node| node.rect.width).unwrap_or(0.0)
    }

    fn force_reflow(&mut self, _el: ElementId) {
        self.reflows += 1;
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.scroll_y,
            document_height: self.document_height(),
            viewport_height: self.viewport.1,
        }
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn scroll_into_view(&mut self, el: ElementId, behavior: ScrollBehavior) {
        let Some(top) = self.node(el).map(|node| node.rect.y) else {
            return;
        };
        match behavior {
            ScrollBehavior::Instant => self.set_scroll_y(top),
            ScrollBehavior::Smooth => {
                let max = self.max_scroll();
                self.scroller.set_position(self.scroll_y);
                self.scroller.scroll_to(top, max, self.clock);
                if !self.scroller.is_animating() {
                    // Smooth scrolling disabled or already there
                    let position = self.scroller.position();
                    self.apply_scroll(position);
                }
            }
        }
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn console_log(&mut self, line: &str) {
        self.console.push(line.to_string());
    }

    fn load_timing(&self) -> Option<LoadTiming> {
        self.load_timing
    }

    fn observe_intersection(&mut self, key: ObserverKey, el: ElementId, options: &ObserverOptions) {
        if self.node(el).is_none()
            || self
                .intersection_watches
                .iter()
                .any(|w| w.key == key && w.target == el)
        {
            return;
        }
        let mut watch = IntersectionWatch {
            key,
            target: el,
            options: options.clone(),
            meets: false,
        };
        // Observers always report a target's initial state
        let entry = self.entry_for(&watch);
        watch.meets = entry.meets(options.threshold);
        self.intersection_watches.push(watch);
        self.pending.push(Observation::Intersection {
            key,
            entries: vec![entry],
        });
    }

    fn unobserve_intersection(&mut self, key: ObserverKey, el: ElementId) {
        self.intersection_watches
            .retain(|w| !(w.key == key && w.target == el));
    }

    fn observe_resize(&mut self, key: ObserverKey, el: ElementId) {
        let Some(rect) = self.rect(el) else {
            return;
        };
        self.resize_watches.push(ResizeWatch {
            key,
            target: el,
            size: (rect.width, rect.height),
        });
        self.pending.push(Observation::Resize { key, target: el });
    }

    fn take_observations(&mut self) -> Vec<Observation> {
        std::mem::take(&mut self.pending)
    }
}
