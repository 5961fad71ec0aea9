//! Page load timing log

use tracing::info;

use crate::dom::Dom;

#[derive(Debug, Default)]
pub struct LoadTelemetry {
    reported: Option<u64>,
}

impl LoadTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the load time once; later calls return the first measurement
    pub fn on_load(&mut self, dom: &mut dyn Dom) -> Option<u64> {
        if self.reported.is_some() {
            return self.reported;
        }
        let timing = dom.load_timing()?;
        let elapsed = timing.elapsed_ms();
        dom.console_log(&format!("Page load time: {}ms", elapsed));
        info!(load_ms = elapsed, "Page loaded");
        self.reported = Some(elapsed);
        self.reported
    }

    pub fn reported(&self) -> Option<u64> {
        self.reported
    }
}
