use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use landkit_core::dom::PageFixture;
use landkit_core::{AppConfig, Script, Session};

pub async fn run(config: AppConfig, fixture: &Path, script: &Path, json: bool) -> Result<()> {
    let fixture = PageFixture::load(fixture)
        .with_context(|| format!("Failed to load fixture {}", fixture.display()))?;
    let script = Script::load(script)
        .with_context(|| format!("Failed to load script {}", script.display()))?;

    info!("Replaying {} nodes with {} steps", fixture.nodes.len(), script.steps.len());
    let mut session = Session::from_fixture(&fixture, config)?;
    let report = session.run(&script).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
