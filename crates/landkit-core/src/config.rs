use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::motion::EasingType;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub entrance: EntranceConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub sticky_cta: StickyCtaConfig,
    #[serde(default)]
    pub carousel: CarouselConfig,
    #[serde(default)]
    pub faq: FaqConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Frame interval for headless animations in milliseconds
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            frame_interval_ms: default_frame_interval(),
        }
    }
}

/// Headless smooth scrolling (browsers use their native implementation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default = "default_true")]
    pub smooth_enabled: bool,
    /// Smooth scroll duration in milliseconds
    #[serde(default = "default_scroll_duration")]
    pub animation_duration_ms: u64,
    #[serde(default)]
    pub easing: EasingType,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            smooth_enabled: default_true(),
            animation_duration_ms: default_scroll_duration(),
            easing: EasingType::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Elements tagged for reveal
    #[serde(default = "default_reveal_selector")]
    pub selector: String,
    /// Class added once an element is revealed
    #[serde(default = "default_reveal_class")]
    pub class: String,
    /// Visible fraction required (0.0-1.0)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// CSS rootMargin applied to the viewport
    #[serde(default = "default_reveal_root_margin")]
    pub root_margin: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            selector: default_reveal_selector(),
            class: default_reveal_class(),
            threshold: default_threshold(),
            root_margin: default_reveal_root_margin(),
        }
    }
}

/// One hero element animated by the entrance timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntranceStep {
    pub selector: String,
    /// Starting vertical offset in pixels
    #[serde(default)]
    pub y: f64,
}

impl EntranceStep {
    fn new(selector: &str, y: f64) -> Self {
        Self {
            selector: selector.to_string(),
            y,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntranceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Delay before the first tween, in seconds
    #[serde(default = "default_entrance_delay")]
    pub delay_secs: f64,
    /// Duration of every tween, in seconds
    #[serde(default = "default_entrance_duration")]
    pub duration_secs: f64,
    /// GSAP position parameter for every tween after the first
    #[serde(default = "default_entrance_position")]
    pub position: String,
    #[serde(default = "default_entrance_ease")]
    pub ease: EasingType,
    #[serde(default = "default_entrance_steps")]
    pub steps: Vec<EntranceStep>,
}

impl Default for EntranceConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            delay_secs: default_entrance_delay(),
            duration_secs: default_entrance_duration(),
            position: default_entrance_position(),
            ease: default_entrance_ease(),
            steps: default_entrance_steps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Id of the progress bar element
    #[serde(default = "default_progress_bar_id")]
    pub bar_id: String,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            bar_id: default_progress_bar_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickyCtaConfig {
    #[serde(default = "default_sticky_bar_id")]
    pub bar_id: String,
    #[serde(default = "default_hero_id")]
    pub hero_id: String,
    /// Hero visibility fraction below which the bar is shown
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_show_class")]
    pub visible_class: String,
}

impl Default for StickyCtaConfig {
    fn default() -> Self {
        Self {
            bar_id: default_sticky_bar_id(),
            hero_id: default_hero_id(),
            threshold: default_threshold(),
            visible_class: default_show_class(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselConfig {
    #[serde(default = "default_carousel_root")]
    pub root: String,
    #[serde(default = "default_carousel_track")]
    pub track: String,
    #[serde(default = "default_carousel_prev")]
    pub prev: String,
    #[serde(default = "default_carousel_next")]
    pub next: String,
    #[serde(default = "default_carousel_dots")]
    pub dots: String,
    #[serde(default = "default_active_class")]
    pub active_class: String,
    /// Minimum horizontal drag (exclusive) that counts as a swipe
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold_px: f64,
    /// CSS transition used for animated slide changes
    #[serde(default = "default_carousel_transition")]
    pub transition: String,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            root: default_carousel_root(),
            track: default_carousel_track(),
            prev: default_carousel_prev(),
            next: default_carousel_next(),
            dots: default_carousel_dots(),
            active_class: default_active_class(),
            swipe_threshold_px: default_swipe_threshold(),
            transition: default_carousel_transition(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqConfig {
    #[serde(default = "default_faq_item")]
    pub item: String,
    #[serde(default = "default_faq_question")]
    pub question: String,
    #[serde(default = "default_faq_answer")]
    pub answer: String,
    /// Class toggled on the question
    #[serde(default = "default_active_class")]
    pub active_class: String,
    /// Class toggled on the answer
    #[serde(default = "default_show_class")]
    pub open_class: String,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            item: default_faq_item(),
            question: default_faq_question(),
            answer: default_faq_answer(),
            active_class: default_active_class(),
            open_class: default_show_class(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// In-page links intercepted for smooth scrolling
    #[serde(default = "default_anchor_selector")]
    pub anchor_selector: String,
    /// Purchase buttons that run the simulated checkout
    #[serde(default = "default_cta_selector")]
    pub cta_selector: String,
    #[serde(default = "default_loading_class")]
    pub loading_class: String,
    /// Label shown while loading (HTML)
    #[serde(default = "default_loading_html")]
    pub loading_html: String,
    /// Simulated processing delay in milliseconds
    #[serde(default = "default_cta_delay")]
    pub delay_ms: u64,
    /// Blocking notice shown once the delay elapses
    #[serde(default = "default_notice")]
    pub notice: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            anchor_selector: default_anchor_selector(),
            cta_selector: default_cta_selector(),
            loading_class: default_loading_class(),
            loading_html: default_loading_html(),
            delay_ms: default_cta_delay(),
            notice: default_notice(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_frame_interval() -> u64 {
    16 // ~60fps
}

fn default_scroll_duration() -> u64 {
    400
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> f64 {
    0.1
}

fn default_reveal_selector() -> String {
    ".reveal".to_string()
}

fn default_reveal_class() -> String {
    "in".to_string()
}

fn default_reveal_root_margin() -> String {
    "0px 0px -50px 0px".to_string()
}

fn default_entrance_delay() -> f64 {
    0.2
}

fn default_entrance_duration() -> f64 {
    1.0
}

fn default_entrance_position() -> String {
    "-=0.8".to_string()
}

fn default_entrance_ease() -> EasingType {
    EasingType::ExpoOut
}

fn default_entrance_steps() -> Vec<EntranceStep> {
    vec![
        EntranceStep::new(".hero-badge", 30.0),
        EntranceStep::new(".hero-title", 50.0),
        EntranceStep::new(".hero-lead", 30.0),
        EntranceStep::new(".hero-cta", 30.0),
    ]
}

fn default_progress_bar_id() -> String {
    "progress-bar".to_string()
}

fn default_sticky_bar_id() -> String {
    "fixed-cta".to_string()
}

fn default_hero_id() -> String {
    "hero".to_string()
}

fn default_show_class() -> String {
    "show".to_string()
}

fn default_active_class() -> String {
    "active".to_string()
}

fn default_carousel_root() -> String {
    ".testimonials-carousel".to_string()
}

fn default_carousel_track() -> String {
    ".testimonials-track".to_string()
}

fn default_carousel_prev() -> String {
    ".testimonials-prev".to_string()
}

fn default_carousel_next() -> String {
    ".testimonials-next".to_string()
}

fn default_carousel_dots() -> String {
    ".testimonials-dots .dot".to_string()
}

fn default_swipe_threshold() -> f64 {
    50.0
}

fn default_carousel_transition() -> String {
    "transform 0.5s cubic-bezier(0.23, 1, 0.32, 1)".to_string()
}

fn default_faq_item() -> String {
    ".faq-item".to_string()
}

fn default_faq_question() -> String {
    ".faq-question".to_string()
}

fn default_faq_answer() -> String {
    ".faq-answer".to_string()
}

fn default_anchor_selector() -> String {
    r##"a[href^="#"]"##.to_string()
}

fn default_cta_selector() -> String {
    ".cta-primary, .cta-secondary, .final-cta button, #fixed-cta button".to_string()
}

fn default_loading_class() -> String {
    "loading".to_string()
}

fn default_loading_html() -> String {
    r#"<i class="fas fa-spinner fa-spin mr-2"></i>処理中..."#.to_string()
}

fn default_cta_delay() -> u64 {
    1500
}

fn default_notice() -> String {
    "在庫確認ページに移動します。\n（実際のサイトでは購入ページにリダイレクトされます）".to_string()
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, self.to_toml()?)?;

        Ok(())
    }

    /// Render configuration as TOML
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/landkit/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("landkit")
            .join("config.toml")
    }
}
