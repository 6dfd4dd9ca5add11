use autocat_source::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog source error: {0}")]
    Source(#[from] SourceError),
}
