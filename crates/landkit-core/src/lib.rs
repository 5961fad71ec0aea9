pub mod components;
pub mod config;
pub mod dom;
pub mod error;
pub mod event;
pub mod motion;
pub mod page;
#[cfg(feature = "session")]
pub mod session;
pub mod timer;

pub use config::AppConfig;
pub use dom::{Dom, ElementId};
pub use error::{Error, Result};
pub use event::{Dispatch, PageEvent};
pub use motion::{Animator, EasingType};
pub use page::Page;
#[cfg(feature = "session")]
pub use session::{Report, Script, Session};
