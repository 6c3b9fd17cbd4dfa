use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Overlay with same name already exists")]
    DuplicateName { name: String },
    #[error("overlay name is empty")]
    EmptyName,
    #[error("no overlay at index {index}")]
    UnknownOverlay { index: usize },
    #[error("overlay {overlay} has no widget {widget_id}")]
    UnknownWidget { overlay: String, widget_id: String },
}
