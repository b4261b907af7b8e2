//! Plain composer: a replacement text entry for a chat web page that keeps
//! the page's own input control hidden and hands messages to it on submit.
//!
//! The engine is host-agnostic. The page is reached only through the
//! [`host::HostDom`] capability trait and persistence through
//! [`store::KeyValueStore`], so everything here runs against
//! [`host::MockHost`] in tests.

pub mod buffer;
pub mod commit;
pub mod drafts;
pub mod error;
pub mod host;
pub mod hotkey;
pub mod layout;
pub mod locator;
pub mod logging;
pub mod notify;
pub mod overlay;
pub mod scheduler;
pub mod settings;
pub mod store;

pub use error::ComposerError;
pub use overlay::{KeyDisposition, Mode, OverlayView, PlainComposer, SubmitOutcome};
pub use settings::Settings;
