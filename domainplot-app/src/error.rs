use thiserror::Error;

use domainplot_core::{CoreError, ValidationError};
use domainplot_render::RenderError;

/// Failures surfaced by the command-line front-end.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}
