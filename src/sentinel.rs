//! Adapters from canonical `Result`-returning operations to the convenience forms.
//! The convenience forms never report an error kind: they log it and hand back a
//! sentinel (`None` / `false`).

use std::path::Path;
use tracing::warn;

use crate::config;
use crate::errors::Result;

/// Swallow the error of `res`, logging it at warn when configured.
pub(crate) fn lenient<T>(op: &str, path: &Path, res: Result<T>) -> Option<T> {
    match res {
        Ok(v) => Some(v),
        Err(e) => {
            if config::current().log_convenience_failures {
                warn!(op, path = %path.display(), kind = %e.kind(), "{e}");
            }
            None
        }
    }
}

/// `lenient` for operations with no meaningful return value.
pub(crate) fn succeeded(op: &str, path: &Path, res: Result<()>) -> bool {
    lenient(op, path, res).is_some()
}
