use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use landkit_core::dom::PageFixture;
use landkit_core::motion::TweenAnimator;
use landkit_core::{AppConfig, Page, PageEvent};

/// Every component the page knows how to wire
const COMPONENTS: [&str; 8] = [
    "reveal",
    "entrance",
    "feedback",
    "progress",
    "carousel",
    "faq",
    "sticky_cta",
    "telemetry",
];

pub fn run(config: AppConfig, fixture: &Path) -> Result<()> {
    let fixture = PageFixture::load(fixture)
        .with_context(|| format!("Failed to load fixture {}", fixture.display()))?;
    let dom = fixture.build(&config.scroll)?;

    let mut page = Page::new(dom, config).with_animator(Box::new(TweenAnimator::new()));
    page.dispatch(PageEvent::DomReady, Duration::ZERO);

    let active = page.active_components();
    println!("Components ({} of {}):\n", active.len(), COMPONENTS.len());
    for name in COMPONENTS {
        let mark = if active.contains(&name) { "on " } else { "off" };
        println!("  [{}] {}", mark, name);
    }

    if fixture.reduced_motion {
        println!("\nReduced motion requested: reveal and entrance are skipped.");
    }

    Ok(())
}
