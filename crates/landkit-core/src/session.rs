//! Headless replay of a scripted visit
//!
//! A [`Session`] drives a [`Page`] over an in-memory DOM on tokio time:
//! script steps, CTA timers and animation frames are multiplexed in one
//! `select!` loop, so paused-time tests replay a visit instantly.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::dom::{Dom, MemoryDom, PageFixture};
use crate::event::PageEvent;
use crate::motion::TweenAnimator;
use crate::page::Page;
use crate::{Error, Result};

/// Ordered list of user actions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Milliseconds after the session starts
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Fire DOM ready
    Ready,
    /// User scroll to an absolute position
    ScrollTo { y: f64 },
    /// Let time pass
    Wait,
    Click { selector: String },
    /// Horizontal touch drag on the first match
    Swipe {
        selector: String,
        from_x: f64,
        to_x: f64,
    },
    ResizeElement {
        selector: String,
        width: f64,
        height: f64,
    },
    ResizeViewport { width: f64, height: f64 },
    /// Fire window load
    Load,
}

impl Script {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Steps in firing order; equal times keep script order
    fn ordered(&self) -> Vec<ScriptStep> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|step| step.at_ms);
        steps
    }
}

/// Observable page state at the end of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub elapsed_ms: u64,
    pub steps: usize,
    pub prevented_clicks: usize,
    pub components: Vec<String>,
    pub entrance_played: bool,
    pub revealed: usize,
    pub scroll_y: f64,
    pub progress_percent: Option<f64>,
    pub cta_visible: Option<bool>,
    pub carousel_index: Option<usize>,
    pub faq_open: Option<usize>,
    pub load_ms: Option<u64>,
    pub alerts: Vec<String>,
    pub console: Vec<String>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string())
        }

        writeln!(f, "Replayed {} steps in {}ms", self.steps, self.elapsed_ms)?;
        writeln!(f, "  components:     {}", self.components.join(", "))?;
        writeln!(f, "  entrance:       {}", if self.entrance_played { "played" } else { "skipped" })?;
        writeln!(f, "  revealed:       {}", self.revealed)?;
        writeln!(f, "  scroll:         {}px", self.scroll_y)?;
        writeln!(f, "  progress:       {}%", opt(&self.progress_percent))?;
        writeln!(f, "  sticky cta:     {}", opt(&self.cta_visible))?;
        writeln!(f, "  carousel index: {}", opt(&self.carousel_index))?;
        writeln!(f, "  open faq:       {}", opt(&self.faq_open))?;
        writeln!(f, "  load time:      {}ms", opt(&self.load_ms))?;
        writeln!(f, "  prevented:      {} clicks", self.prevented_clicks)?;
        for alert in &self.alerts {
            writeln!(f, "  alert:          {}", alert.replace('\n', " "))?;
        }
        for line in &self.console {
            writeln!(f, "  console:        {}", line)?;
        }
        Ok(())
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

pub struct Session {
    page: Page<MemoryDom>,
    frame_interval: Duration,
    prevented_clicks: usize,
}

impl Session {
    pub fn new(page: Page<MemoryDom>) -> Self {
        let frame_interval = Duration::from_millis(page.config().general.frame_interval_ms.max(1));
        Self {
            page,
            frame_interval,
            prevented_clicks: 0,
        }
    }

    /// Build the fixture page with the headless animator attached
    pub fn from_fixture(fixture: &PageFixture, config: AppConfig) -> Result<Self> {
        let dom = fixture.build(&config.scroll)?;
        let page = Page::new(dom, config).with_animator(Box::new(TweenAnimator::new()));
        Ok(Self::new(page))
    }

    pub fn page(&self) -> &Page<MemoryDom> {
        &self.page
    }

    /// Replay `script` until every step ran, every timer fired and every
    /// animation settled
    pub async fn run(&mut self, script: &Script) -> Result<Report> {
        let steps = script.ordered();
        let start = Instant::now();
        let mut next_step = 0;

        let mut frames = time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Replaying {} steps", steps.len());
        loop {
            let animating = self.page.is_animating() || self.page.dom().is_scrolling();
            let step_deadline = steps
                .get(next_step)
                .map(|step| start + Duration::from_millis(step.at_ms));
            let timer_deadline = self.page.next_deadline().map(|due| start + due);

            if step_deadline.is_none() && timer_deadline.is_none() && !animating {
                break;
            }

            tokio::select! {
                biased;

                _ = sleep_until_opt(timer_deadline) => {
                    let now = start.elapsed();
                    self.page.dom_mut().set_clock(now);
                    let fired = self.page.fire_due(now);
                    debug!("{} timers fired at {:?}", fired, now);
                }

                _ = sleep_until_opt(step_deadline) => {
                    let now = start.elapsed();
                    let step = &steps[next_step];
                    next_step += 1;
                    debug!(at_ms = step.at_ms, action = ?step.action, "Step");
                    self.apply(&step.action, now)?;
                }

                _ = frames.tick(), if animating => {
                    let now = start.elapsed();
                    self.page.dom_mut().advance_scroll(now);
                    self.page.frame(now);
                }
            }

            self.flush_scroll(start.elapsed());
        }

        Ok(self.report(start.elapsed(), steps.len()))
    }

    fn apply(&mut self, action: &Action, now: Duration) -> Result<()> {
        self.page.dom_mut().set_clock(now);
        match action {
            Action::Ready => {
                self.page.dispatch(PageEvent::DomReady, now);
            }
            Action::ScrollTo { y } => self.page.dom_mut().set_scroll_y(*y),
            Action::Wait => {}
            Action::Click { selector } => {
                let target = self.resolve(selector)?;
                if self.page.dispatch(PageEvent::Click { target }, now).default_prevented {
                    self.prevented_clicks += 1;
                }
            }
            Action::Swipe {
                selector,
                from_x,
                to_x,
            } => {
                let target = self.resolve(selector)?;
                self.page
                    .dispatch(PageEvent::TouchStart { target, x: *from_x }, now);
                self.page
                    .dispatch(PageEvent::TouchEnd { target, x: *to_x }, now);
            }
            Action::ResizeElement {
                selector,
                width,
                height,
            } => {
                let target = self.resolve(selector)?;
                self.page.dom_mut().set_size(target, *width, *height);
                self.page.pump();
            }
            Action::ResizeViewport { width, height } => {
                self.page.dom_mut().set_viewport(*width, *height);
                self.page.pump();
            }
            Action::Load => {
                self.page.dispatch(PageEvent::Load, now);
            }
        }
        Ok(())
    }

    fn resolve(&self, selector: &str) -> Result<crate::dom::ElementId> {
        self.page
            .dom()
            .query(selector)?
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }

    /// Deliver a scroll event when the position moved since the last one
    fn flush_scroll(&mut self, now: Duration) {
        if self.page.dom_mut().take_scroll_dirty() {
            self.page.dispatch(PageEvent::Scroll, now);
        }
    }

    pub fn report(&self, elapsed: Duration, steps: usize) -> Report {
        let dom = self.page.dom();
        Report {
            elapsed_ms: elapsed.as_millis() as u64,
            steps,
            prevented_clicks: self.prevented_clicks,
            components: self
                .page
                .active_components()
                .into_iter()
                .map(str::to_string)
                .collect(),
            entrance_played: self.page.entrance_played(),
            revealed: self.page.revealed(),
            scroll_y: dom.scroll_y(),
            progress_percent: self.page.progress_percent(),
            cta_visible: self.page.cta_visible(),
            carousel_index: self.page.carousel_index(),
            faq_open: self.page.faq_open(),
            load_ms: self.page.load_ms(),
            alerts: dom.alerts().to_vec(),
            console: dom.console().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r##"
        viewport = [1000.0, 800.0]
        document_height = 3000.0

        [load]
        navigation_start_ms = 0.0
        load_event_end_ms = 0.0
        elapsed_since_navigation_ms = 512.4

        [[nodes]]
        id = "progress-bar"

        [[nodes]]
        tag = "section"
        id = "hero"
        rect = [0.0, 0.0, 1000.0, 700.0]

        [[nodes.children]]
        class = "hero-badge"

        [[nodes.children]]
        tag = "button"
        class = "cta-primary"
        html = "Buy"

        [[nodes]]
        class = "reveal"
        rect = [0.0, 1700.0, 1000.0, 200.0]

        [[nodes]]
        class = "testimonials-carousel"
        rect = [0.0, 1200.0, 1000.0, 400.0]

        [[nodes.children]]
        class = "testimonials-track"

        [[nodes.children.children]]
        rect = [0.0, 1200.0, 500.0, 400.0]

        [[nodes.children.children]]
        rect = [500.0, 1200.0, 500.0, 400.0]

        [[nodes.children.children]]
        rect = [1000.0, 1200.0, 500.0, 400.0]

        [[nodes.children]]
        tag = "button"
        class = "testimonials-prev"

        [[nodes]]
        id = "faq"
        rect = [0.0, 2000.0, 1000.0, 600.0]

        [[nodes.children]]
        class = "faq-item"

        [[nodes.children.children]]
        class = "faq-question"

        [[nodes.children.children]]
        class = "faq-answer"

        [[nodes]]
        id = "fixed-cta"
    "##;

    const SCRIPT: &str = r#"
        [[steps]]
        at_ms = 0
        action = "ready"

        [[steps]]
        at_ms = 50
        action = "load"

        [[steps]]
        at_ms = 200
        action = "click"
        selector = ".cta-primary"

        [[steps]]
        at_ms = 400
        action = "click"
        selector = ".testimonials-prev"

        [[steps]]
        at_ms = 600
        action = "swipe"
        selector = ".testimonials-track div"
        from_x = 300.0
        to_x = 500.0

        [[steps]]
        at_ms = 800
        action = "scroll_to"
        y = 1500

        [[steps]]
        at_ms = 900
        action = "click"
        selector = ".faq-question"
    "#;

    fn session(reduced_motion: bool) -> Session {
        let mut fixture = PageFixture::from_toml(FIXTURE).unwrap();
        fixture.reduced_motion = reduced_motion;
        Session::from_fixture(&fixture, AppConfig::default()).unwrap()
    }

    #[test]
    fn test_script_parsing() {
        let script = Script::from_toml(SCRIPT).unwrap();
        assert_eq!(script.steps.len(), 7);
        assert_eq!(
            script.steps[4].action,
            Action::Swipe {
                selector: ".testimonials-track div".to_string(),
                from_x: 300.0,
                to_x: 500.0
            }
        );
        assert_eq!(script.steps[5].action, Action::ScrollTo { y: 1500.0 });

        let json = Script::from_json(r#"{"steps":[{"at_ms":5,"action":"wait"}]}"#).unwrap();
        assert_eq!(json.steps[0].action, Action::Wait);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_visit() {
        let mut session = session(false);
        let report = session.run(&Script::from_toml(SCRIPT).unwrap()).await.unwrap();

        assert_eq!(report.steps, 7);
        assert!(report.entrance_played);
        // Entrance settles at 1.2s; the CTA notice is the last thing to fire
        assert!((1700..1750).contains(&report.elapsed_ms));
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.prevented_clicks, 1);
        assert_eq!(report.console, vec!["Page load time: 512ms".to_string()]);
        assert_eq!(report.load_ms, Some(512));
        // prev wraps to 2, rightward swipe goes back to 1
        assert_eq!(report.carousel_index, Some(1));
        assert_eq!(report.faq_open, Some(0));
        assert_eq!(report.revealed, 1);
        assert_eq!(report.cta_visible, Some(true));
        let percent = report.progress_percent.unwrap();
        assert!((percent - 68.1818).abs() < 1e-3);

        let cta = session.page().dom().query(".cta-primary").unwrap().unwrap();
        assert_eq!(session.page().dom().inner_html(cta), "Buy");
        assert_eq!(session.page().pending_ctas(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reduced_motion_visit() {
        let mut session = session(true);
        let script = Script::from_toml(
            r#"
            [[steps]]
            at_ms = 0
            action = "ready"
            "#,
        )
        .unwrap();
        let report = session.run(&script).await.unwrap();
        assert!(!report.entrance_played);
        assert!(!report.components.contains(&"reveal".to_string()));
        assert_eq!(report.elapsed_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_selector_fails() {
        let mut session = session(false);
        let script = Script::from_toml(
            r#"
            [[steps]]
            action = "click"
            selector = ".nope"
            "#,
        )
        .unwrap();
        assert!(matches!(
            session.run(&script).await,
            Err(Error::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_report_display() {
        let report = Report {
            elapsed_ms: 1700,
            steps: 2,
            prevented_clicks: 1,
            components: vec!["carousel".to_string()],
            entrance_played: false,
            revealed: 0,
            scroll_y: 0.0,
            progress_percent: None,
            cta_visible: Some(false),
            carousel_index: Some(2),
            faq_open: None,
            load_ms: None,
            alerts: vec!["a\nb".to_string()],
            console: vec![],
        };
        let text = report.to_string();
        assert!(text.starts_with("Replayed 2 steps in 1700ms"));
        assert!(text.contains("carousel index: 2"));
        assert!(text.contains("alert:          a b"));
    }
}
