pub mod carousel;
pub mod entrance;
pub mod faq;
pub mod feedback;
pub mod progress;
pub mod reveal;
pub mod sticky_cta;
pub mod telemetry;

pub use carousel::{Carousel, CarouselClick, CarouselState, Swipe, SwipeTracker};
pub use entrance::EntranceSequencer;
pub use faq::{AccordionState, FaqAccordion};
pub use feedback::InteractionFeedback;
pub use progress::{scroll_percent, ScrollProgress};
pub use reveal::RevealObserver;
pub use sticky_cta::StickyCta;
pub use telemetry::LoadTelemetry;
