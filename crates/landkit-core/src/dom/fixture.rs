//! Page fixtures: a serializable description of markup plus layout
//!
//! ```toml
//! viewport = [1280.0, 800.0]
//!
//! [[nodes]]
//! tag = "section"
//! id = "hero"
//! rect = [0.0, 0.0, 1280.0, 720.0]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ScrollConfig;
use crate::{Error, Result};

use super::geometry::Rect;
use super::memory::{ElementSpec, MemoryDom};
use super::{ElementId, LoadTiming};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFixture {
    /// Viewport width and height in pixels
    #[serde(default = "default_viewport")]
    pub viewport: [f64; 2],
    /// Scroll height; derived from the layout when omitted
    #[serde(default)]
    pub document_height: Option<f64>,
    #[serde(default)]
    pub reduced_motion: bool,
    /// Navigation timing reported on load
    #[serde(default)]
    pub load: Option<LoadTiming>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Space separated class list
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub style: BTreeMap<String, String>,
    #[serde(default)]
    pub html: String,
    /// `[x, y, width, height]` in document coordinates
    #[serde(default)]
    pub rect: Option<[f64; 4]>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

fn default_viewport() -> [f64; 2] {
    [1280.0, 800.0]
}

fn default_tag() -> String {
    "div".to_string()
}

impl PageFixture {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a fixture, choosing the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") | None => Self::from_toml(&content),
            Some(other) => Err(Error::Fixture(format!(
                "unsupported fixture format '.{}'",
                other
            ))),
        }
    }

    /// Build the in-memory page described by this fixture
    pub fn build(&self, scroll: &ScrollConfig) -> Result<MemoryDom> {
        let [width, height] = self.viewport;
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(Error::Fixture(format!(
                "viewport must be positive, got {}x{}",
                width, height
            )));
        }

        let mut dom = MemoryDom::new(width, height);
        dom.set_scroll_config(scroll.clone());
        dom.set_reduced_motion(self.reduced_motion);
        dom.set_load_timing(self.load);

        let root = dom.root();
        for node in &self.nodes {
            append_tree(&mut dom, root, node)?;
        }
        dom.set_document_height(self.document_height);
        Ok(dom)
    }
}

fn append_tree(dom: &mut MemoryDom, parent: ElementId, spec: &NodeSpec) -> Result<()> {
    let mut element = ElementSpec::new(&spec.tag).class(&spec.class).html(&spec.html);
    if let Some(id) = &spec.id {
        element = element.id(id);
    }
    for (name, value) in &spec.attrs {
        element = element.attr(name, value);
    }
    element.styles = spec.style.clone();
    element.rect = spec.rect.map(|[x, y, w, h]| Rect::new(x, y, w, h));

    let el = dom.append(parent, element)?;
    for child in &spec.children {
        append_tree(dom, el, child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;

    const FIXTURE: &str = r##"
        viewport = [1000.0, 800.0]
        reduced_motion = true

        [load]
        navigation_start_ms = 100.0
        load_event_end_ms = 900.0

        [[nodes]]
        tag = "section"
        id = "hero"
        rect = [0.0, 0.0, 1000.0, 700.0]

        [[nodes.children]]
        tag = "a"
        class = "cta-primary btn"
        attrs = { href = "#faq" }
        html = "Buy now"

        [[nodes]]
        class = "testimonials-track"
        style = { gap = "24px" }
        rect = [0.0, 900.0, 1000.0, 300.0]
    "##;

    #[test]
    fn test_fixture_builds_tree() {
        let fixture = PageFixture::from_toml(FIXTURE).unwrap();
        let dom = fixture.build(&ScrollConfig::default()).unwrap();

        let hero = dom.element_by_id("hero").unwrap();
        let link = dom.query(r##"a[href^="#"]"##).unwrap().unwrap();
        assert_eq!(dom.parent(link), Some(hero));
        assert!(dom.has_class(link, "btn"));
        assert_eq!(dom.inner_html(link), "Buy now");
        assert_eq!(dom.rect(link), dom.rect(hero));

        let track = dom.query(".testimonials-track").unwrap().unwrap();
        assert_eq!(dom.computed_gap(track), 24.0);

        assert!(dom.prefers_reduced_motion());
        assert_eq!(dom.load_timing().unwrap().elapsed_ms(), 800);
        assert_eq!(dom.scroll_metrics().document_height, 1200.0);
    }

    #[test]
    fn test_fixture_rejects_bad_viewport() {
        let fixture = PageFixture::from_toml("viewport = [0.0, 800.0]").unwrap();
        assert!(matches!(
            fixture.build(&ScrollConfig::default()),
            Err(Error::Fixture(_))
        ));
    }

    #[test]
    fn test_fixture_from_json() {
        let fixture = PageFixture::from_json(
            r#"{ "document_height": 800.0, "nodes": [{ "id": "progress-bar" }] }"#,
        )
        .unwrap();
        let dom = fixture.build(&ScrollConfig::default()).unwrap();
        assert!(dom.element_by_id("progress-bar").is_some());
        assert_eq!(dom.scroll_metrics().document_height, 800.0);
    }
}
