use engine::EngineError;
use thiserror::Error;

use crate::api::ApiError;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("invalid step: {0}")]
    InvalidStep(String),
}
