//! Testimonials carousel: circular index state, swipe detection and the
//! track binding that turns the index into a pixel translation.

use tracing::{debug, warn};

use crate::config::CarouselConfig;
use crate::dom::{css_number, Dom, ElementId, ObserverKey};
use crate::{Error, Result};

/// Current slide of a fixed-size carousel; `current < total` always holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselState {
    current: usize,
    total: usize,
}

impl CarouselState {
    /// `None` for an empty carousel
    pub fn new(total: usize) -> Option<Self> {
        (total > 0).then_some(Self { current: 0, total })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn next(&mut self) -> usize {
        self.current = (self.current + 1) % self.total;
        self.current
    }

    pub fn prev(&mut self) -> usize {
        self.current = (self.current + self.total - 1) % self.total;
        self.current
    }

    /// Jump to `index`, rejecting anything outside `0..total`
    pub fn go_to(&mut self, index: usize) -> Result<usize> {
        if index >= self.total {
            return Err(Error::SlideOutOfRange {
                index,
                total: self.total,
            });
        }
        self.current = index;
        Ok(self.current)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    /// Leftward drag
    Next,
    /// Rightward drag
    Prev,
}

/// Horizontal swipe detection between touch start and touch end
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: f64,
    start_x: Option<f64>,
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start_x: None,
        }
    }

    pub fn start(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Finish a gesture. Only drags strictly longer than the threshold count.
    pub fn end(&mut self, x: f64) -> Option<Swipe> {
        let start = self.start_x.take()?;
        let delta = start - x;
        if delta > self.threshold {
            Some(Swipe::Next)
        } else if delta < -self.threshold {
            Some(Swipe::Prev)
        } else {
            None
        }
    }
}

/// What a click inside the carousel did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselClick {
    Prev,
    Next,
    Dot(usize),
}

pub struct Carousel {
    root: ElementId,
    track: ElementId,
    slides: Vec<ElementId>,
    prev: Option<ElementId>,
    next: Option<ElementId>,
    dots: Vec<ElementId>,
    state: CarouselState,
    swipe: SwipeTracker,
    active_class: String,
    transition: String,
}

impl Carousel {
    /// Bind to the first carousel root; `None` when it is absent or has no slides
    pub fn bind(dom: &mut dyn Dom, config: &CarouselConfig) -> Result<Option<Self>> {
        let Some(root) = dom.query(&config.root)? else {
            return Ok(None);
        };
        let Some(track) = dom.query_within(root, &config.track)?.into_iter().next() else {
            warn!("Carousel root has no '{}' track", config.track);
            return Ok(None);
        };
        let slides = dom.children(track);
        let Some(state) = CarouselState::new(slides.len()) else {
            debug!("Carousel track is empty");
            return Ok(None);
        };

        let prev = dom.query_within(root, &config.prev)?.into_iter().next();
        let next = dom.query_within(root, &config.next)?.into_iter().next();
        let dots = dom.query_within(root, &config.dots)?;
        if !dots.is_empty() && dots.len() != slides.len() {
            warn!(
                "Carousel has {} dots for {} slides; extra dots are inert",
                dots.len(),
                slides.len()
            );
        }

        dom.observe_resize(ObserverKey::Carousel, root);
        debug!("Carousel bound with {} slides", slides.len());

        Ok(Some(Self {
            root,
            track,
            slides,
            prev,
            next,
            dots,
            state,
            swipe: SwipeTracker::new(config.swipe_threshold_px),
            active_class: config.active_class.clone(),
            transition: config.transition.clone(),
        }))
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn current(&self) -> usize {
        self.state.current()
    }

    pub fn total(&self) -> usize {
        self.state.total()
    }

    /// Pixel offset of the current slide
    pub fn offset(&self, dom: &dyn Dom) -> f64 {
        let slide_width = dom.bounding_width(self.slides[0]);
        let gap = dom.computed_gap(self.track);
        (slide_width + gap) * self.state.current() as f64
    }

    /// Apply the current index to the track and the dots
    pub fn update(&self, dom: &mut dyn Dom, instant: bool) {
        let offset = self.offset(dom);
        let transition = if instant { "none" } else { self.transition.as_str() };
        dom.set_style(self.track, "transition", transition);
        dom.set_style(
            self.track,
            "transform",
            &format!("translateX(-{}px)", css_number(offset)),
        );
        if instant {
            dom.force_reflow(self.track);
            dom.set_style(self.track, "transition", "");
        }

        let current = self.state.current();
        for (i, &dot) in self.dots.iter().enumerate() {
            dom.toggle_class(dot, &self.active_class, Some(i == current));
        }
    }

    pub fn next(&mut self, dom: &mut dyn Dom) {
        self.state.next();
        self.update(dom, false);
    }

    pub fn prev(&mut self, dom: &mut dyn Dom) {
        self.state.prev();
        self.update(dom, false);
    }

    pub fn go_to(&mut self, dom: &mut dyn Dom, index: usize) -> Result<()> {
        self.state.go_to(index)?;
        self.update(dom, false);
        Ok(())
    }

    /// Which control, if any, `el` is
    pub fn control(&self, el: ElementId) -> Option<CarouselClick> {
        if Some(el) == self.prev {
            Some(CarouselClick::Prev)
        } else if Some(el) == self.next {
            Some(CarouselClick::Next)
        } else {
            self.dots.iter().position(|&dot| dot == el).map(CarouselClick::Dot)
        }
    }

    /// Handle a click on `el`; returns whether it was a carousel control
    pub fn handle_click(&mut self, dom: &mut dyn Dom, el: ElementId) -> bool {
        match self.control(el) {
            Some(CarouselClick::Prev) => self.prev(dom),
            Some(CarouselClick::Next) => self.next(dom),
            Some(CarouselClick::Dot(index)) => {
                if let Err(e) = self.go_to(dom, index) {
                    debug!("Ignoring dot click: {}", e);
                }
            }
            None => return false,
        }
        true
    }

    pub fn in_track(&self, dom: &dyn Dom, el: ElementId) -> bool {
        dom.contains(self.track, el)
    }

    pub fn touch_start(&mut self, x: f64) {
        self.swipe.start(x);
    }

    pub fn touch_end(&mut self, dom: &mut dyn Dom, x: f64) -> Option<Swipe> {
        let swipe = self.swipe.end(x)?;
        match swipe {
            Swipe::Next => self.next(dom),
            Swipe::Prev => self.prev(dom),
        }
        Some(swipe)
    }

    /// Container resized: reposition without animating or changing the index
    pub fn on_resize(&mut self, dom: &mut dyn Dom) {
        self.update(dom, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::ElementSpec;
    use crate::dom::MemoryDom;

    struct Fixture {
        dom: MemoryDom,
        root: ElementId,
        track: ElementId,
        slides: Vec<ElementId>,
        prev: ElementId,
        next: ElementId,
        dots: Vec<ElementId>,
    }

    fn fixture(slides: usize, dots: usize) -> Fixture {
        let mut dom = MemoryDom::new(1280.0, 800.0);
        let body = dom.root();
        let root = dom
            .append(body, ElementSpec::new("div").class("testimonials-carousel").rect(0.0, 0.0, 1000.0, 400.0))
            .unwrap();
        let track = dom.append(root, ElementSpec::new("div").class("testimonials-track")).unwrap();
        dom.set_style(track, "gap", "24px");
        let slides = (0..slides)
            .map(|i| {
                dom.append(
                    track,
                    ElementSpec::new("article").rect(i as f64 * 424.0, 0.0, 400.0, 400.0),
                )
                .unwrap()
            })
            .collect();
        let prev = dom.append(root, ElementSpec::new("button").class("testimonials-prev")).unwrap();
        let next = dom.append(root, ElementSpec::new("button").class("testimonials-next")).unwrap();
        let dot_list = dom.append(root, ElementSpec::new("div").class("testimonials-dots")).unwrap();
        let dots = (0..dots)
            .map(|_| dom.append(dot_list, ElementSpec::new("button").class("dot")).unwrap())
            .collect();
        Fixture {
            dom,
            root,
            track,
            slides,
            prev,
            next,
            dots,
        }
    }

    fn bind(f: &mut Fixture) -> Carousel {
        Carousel::bind(&mut f.dom, &CarouselConfig::default()).unwrap().unwrap()
    }

    #[test]
    fn test_next_cycles_back_to_start() {
        for n in 1..=7 {
            let mut state = CarouselState::new(n).unwrap();
            for _ in 0..n {
                state.next();
            }
            assert_eq!(state.current(), 0);
        }
    }

    #[test]
    fn test_prev_wraps_from_zero() {
        for n in 1..=7 {
            let mut state = CarouselState::new(n).unwrap();
            assert_eq!(state.prev(), n - 1);
        }
    }

    #[test]
    fn test_five_slide_scenario() {
        let mut state = CarouselState::new(5).unwrap();
        for _ in 0..5 {
            state.next();
        }
        assert_eq!(state.current(), 0);
        assert_eq!(state.prev(), 4);
    }

    #[test]
    fn test_go_to_rejects_out_of_range() {
        let mut state = CarouselState::new(3).unwrap();
        assert_eq!(state.go_to(2).unwrap(), 2);
        assert!(matches!(
            state.go_to(3),
            Err(Error::SlideOutOfRange { index: 3, total: 3 })
        ));
        assert_eq!(state.current(), 2);
        assert!(CarouselState::new(0).is_none());
    }

    #[test]
    fn test_swipe_threshold_is_strict() {
        let mut swipe = SwipeTracker::new(50.0);
        swipe.start(300.0);
        assert_eq!(swipe.end(250.0), None);
        swipe.start(300.0);
        assert_eq!(swipe.end(249.0), Some(Swipe::Next));
        swipe.start(300.0);
        assert_eq!(swipe.end(350.0), None);
        swipe.start(300.0);
        assert_eq!(swipe.end(351.0), Some(Swipe::Prev));
        // No matching start
        assert_eq!(swipe.end(0.0), None);
    }

    #[test]
    fn test_navigation_moves_track_and_dots() {
        let mut f = fixture(5, 5);
        let mut carousel = bind(&mut f);

        assert!(carousel.handle_click(&mut f.dom, f.next));
        assert_eq!(carousel.current(), 1);
        assert_eq!(f.dom.style(f.track, "transform").as_deref(), Some("translateX(-424px)"));
        assert_eq!(
            f.dom.style(f.track, "transition").as_deref(),
            Some("transform 0.5s cubic-bezier(0.23, 1, 0.32, 1)")
        );
        assert!(f.dom.has_class(f.dots[1], "active"));
        assert!(!f.dom.has_class(f.dots[0], "active"));

        assert!(carousel.handle_click(&mut f.dom, f.dots[3]));
        assert_eq!(f.dom.style(f.track, "transform").as_deref(), Some("translateX(-1272px)"));
        assert_eq!(
            f.dots.iter().filter(|&&d| f.dom.has_class(d, "active")).count(),
            1
        );

        assert!(carousel.handle_click(&mut f.dom, f.prev));
        assert_eq!(carousel.current(), 2);
        assert!(!carousel.handle_click(&mut f.dom, f.slides[0]));
    }

    #[test]
    fn test_resize_repositions_instantly() {
        let mut f = fixture(3, 3);
        let mut carousel = bind(&mut f);
        carousel.go_to(&mut f.dom, 2).unwrap();

        f.dom.set_size(f.slides[0], 300.0, 400.0);
        let reflows = f.dom.reflow_count();
        carousel.on_resize(&mut f.dom);

        assert_eq!(carousel.current(), 2);
        assert_eq!(f.dom.style(f.track, "transform").as_deref(), Some("translateX(-648px)"));
        // Transition was suppressed for this update only
        assert_eq!(f.dom.reflow_count(), reflows + 1);
        assert!(f.dom.style(f.track, "transition").is_none());

        carousel.next(&mut f.dom);
        assert!(f.dom.style(f.track, "transition").is_some());
    }

    #[test]
    fn test_extra_dots_are_inert() {
        let mut f = fixture(2, 4);
        let mut carousel = bind(&mut f);
        assert!(carousel.handle_click(&mut f.dom, f.dots[3]));
        assert_eq!(carousel.current(), 0);

        carousel.next(&mut f.dom);
        assert!(f.dom.has_class(f.dots[1], "active"));
        assert!(!f.dom.has_class(f.dots[3], "active"));
    }

    #[test]
    fn test_swipe_on_track() {
        let mut f = fixture(3, 0);
        let mut carousel = bind(&mut f);
        assert!(carousel.in_track(&f.dom, f.slides[1]));
        assert!(!carousel.in_track(&f.dom, f.next));

        carousel.touch_start(400.0);
        assert_eq!(carousel.touch_end(&mut f.dom, 200.0), Some(Swipe::Next));
        assert_eq!(carousel.current(), 1);

        carousel.touch_start(200.0);
        assert_eq!(carousel.touch_end(&mut f.dom, 230.0), None);
        assert_eq!(carousel.current(), 1);
    }

    #[test]
    fn test_bind_observes_root_resize() {
        let mut f = fixture(3, 3);
        let carousel = bind(&mut f);
        assert_eq!(carousel.root(), f.root);
        assert!(!f.dom.take_observations().is_empty());
    }

    #[test]
    fn test_empty_track_is_a_noop() {
        let mut f = fixture(0, 0);
        assert!(Carousel::bind(&mut f.dom, &CarouselConfig::default())
            .unwrap()
            .is_none());
    }
}
