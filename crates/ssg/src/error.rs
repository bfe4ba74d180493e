//! CLI error types.

use ssg_config::ConfigError;
use ssg_site::RenderError;
use ssg_storage::StorageError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("{failed} of {total} files failed to build")]
    Build { failed: usize, total: usize },
}
