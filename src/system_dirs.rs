//! Well-known per-user directories behind a small capability trait.
//! The default implementation asks the `dirs` crate; tests or embedders can supply
//! their own (e.g. pointing everything into a sandbox).

use crate::directory::Directory;

/// Source of the platform's standard directories. `None` means the platform has
/// no such location (or it could not be determined).
pub trait SystemDirectories {
    fn home(&self) -> Option<Directory>;
    fn desktop(&self) -> Option<Directory>;
    fn downloads(&self) -> Option<Directory>;
    fn documents(&self) -> Option<Directory>;
    fn cache(&self) -> Option<Directory>;
    fn config(&self) -> Option<Directory>;
    fn data(&self) -> Option<Directory>;
    fn temp(&self) -> Option<Directory>;
}

/// `SystemDirectories` backed by the `dirs` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSystemDirectories;

fn wrap(path: Option<std::path::PathBuf>) -> Option<Directory> {
    path.and_then(|p| Directory::from_path(&p).ok())
}

impl SystemDirectories for DefaultSystemDirectories {
    fn home(&self) -> Option<Directory> {
        wrap(dirs::home_dir())
    }

    fn desktop(&self) -> Option<Directory> {
        wrap(dirs::desktop_dir())
    }

    fn downloads(&self) -> Option<Directory> {
        wrap(dirs::download_dir())
    }

    fn documents(&self) -> Option<Directory> {
        wrap(dirs::document_dir())
    }

    fn cache(&self) -> Option<Directory> {
        wrap(dirs::cache_dir())
    }

    fn config(&self) -> Option<Directory> {
        wrap(dirs::config_dir())
    }

    fn data(&self) -> Option<Directory> {
        wrap(dirs::data_dir())
    }

    fn temp(&self) -> Option<Directory> {
        wrap(Some(std::env::temp_dir()))
    }
}
