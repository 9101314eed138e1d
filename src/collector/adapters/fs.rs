//! Filesystem model loader.
//!
//! Reads JSON files holding either one model definition or an array of them.
//! Relative locations resolve against the loader's base directory; absolute
//! locations are opened as given.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde_json::Value;

use crate::collector::{
    domain::{ModelDefinition, one_or_many},
    ports::{LoaderError, LoaderResult, ModelLoader},
};

/// Loads model definitions from JSON files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirModelLoader {
    base_dir: Utf8PathBuf,
}

impl DirModelLoader {
    /// Creates a loader resolving relative locations against `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the directory relative locations resolve against.
    #[must_use]
    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Returns the full path a location resolves to.
    #[must_use]
    pub fn resolve_path(&self, location: &str) -> Utf8PathBuf {
        let path = Utf8Path::new(location);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ModelLoader for DirModelLoader {
    fn load(&self, location: &str) -> LoaderResult<Vec<ModelDefinition>> {
        let path = self.resolve_path(location);
        let file_name = path
            .file_name()
            .ok_or_else(|| LoaderError::NotFound(location.to_owned()))?;
        let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority())
            .map_err(|err| not_found_or_io(location, err))?;
        let contents = dir
            .read_to_string(file_name)
            .map_err(|err| not_found_or_io(location, err))?;
        let document: Value = serde_json::from_str(&contents)
            .map_err(|err| LoaderError::parse(location, err))?;
        one_or_many(document).map_err(|err| LoaderError::parse(location, err))
    }
}

fn not_found_or_io(location: &str, err: std::io::Error) -> LoaderError {
    if err.kind() == std::io::ErrorKind::NotFound {
        LoaderError::NotFound(location.to_owned())
    } else {
        LoaderError::io(location, err)
    }
}
