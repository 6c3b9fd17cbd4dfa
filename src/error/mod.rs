use crate::backend::BackendError;
use crate::color::ColorError;
use crate::config::ConfigPathError;
use crate::store::StoreError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    ConfigPath(#[from] ConfigPathError),
}
