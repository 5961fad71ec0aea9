//! Input events delivered to a page

use serde::{Deserialize, Serialize};

use crate::dom::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// Document parsed; components are wired up
    DomReady,
    /// Window scrolled (passive)
    Scroll,
    Click { target: ElementId },
    /// Touch began at client x
    TouchStart { target: ElementId, x: f64 },
    /// Touch ended at client x
    TouchEnd { target: ElementId, x: f64 },
    /// Window load finished
    Load,
}

/// Outcome of dispatching one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// A handler cancelled the browser's default action
    pub default_prevented: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = PageEvent::Click { target: ElementId(7) };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"click","target":7}"#);

        let parsed: PageEvent = serde_json::from_str(r#"{"type":"touch_end","target":3,"x":12.5}"#).unwrap();
        assert_eq!(
            parsed,
            PageEvent::TouchEnd {
                target: ElementId(3),
                x: 12.5
            }
        );
    }
}
