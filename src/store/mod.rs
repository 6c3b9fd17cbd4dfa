//! In-memory overlay collection and the editing operations on it.

pub mod collection;
pub mod error;
pub mod model;

pub use collection::OverlayStore;
pub use error::{StoreError, StoreResult};
pub use model::{Overlay, Widget, WidgetKind};
