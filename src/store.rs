use std::{
    fs::{self, OpenOptions},
    io,
    path::PathBuf,
};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    error::StoreError,
    models::{SCRIPT_EXTENSION, ScriptId},
};

/// Text storage for scripts, keyed by script name.
pub trait ScriptStore {
    /// Names of every script currently stored, sorted.
    fn list(&self) -> Result<Vec<ScriptId>, StoreError>;

    fn read(&self, id: &ScriptId) -> Result<String, StoreError>;

    /// Replaces the stored text, creating the script if needed.
    fn write(&mut self, id: &ScriptId, text: &str) -> Result<(), StoreError>;

    /// Creates an empty script; fails with `AlreadyExists` if one is present.
    fn create(&mut self, id: &ScriptId) -> Result<(), StoreError>;

    fn delete(&mut self, id: &ScriptId) -> Result<(), StoreError>;

    /// Path handed to the interpreter for this script.
    fn path_of(&self, id: &ScriptId) -> PathBuf;
}

/// Scripts kept as `<name>.m` files directly inside one directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ScriptStore for FsStore {
    fn list(&self) -> Result<Vec<ScriptId>, StoreError> {
        let mut ids = Vec::new();

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let file = self.root.display().to_string();
                match e.into_io_error() {
                    Some(io) => StoreError::from_io(file, io),
                    None => StoreError::Io {
                        file,
                        source: std::io::Error::other("directory loop"),
                    },
                }
            })?;

            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION)
            {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(path = %path.display(), "Skipping script with non UTF-8 name");
                continue;
            };
            match ScriptId::new(stem) {
                // Names like `x.m.m` or ` x.m` would map back to another file.
                Ok(id) if entry.file_name() != id.file_name().as_str() => {
                    warn!(path = %path.display(), "Skipping script whose name does not map back to it");
                }
                Ok(id) => ids.push(id),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping script"),
            }
        }

        ids.sort();
        ids.dedup();
        debug!(root = %self.root.display(), count = ids.len(), "Listed scripts");
        Ok(ids)
    }

    fn read(&self, id: &ScriptId) -> Result<String, StoreError> {
        let text = fs::read_to_string(self.path_of(id))
            .map_err(|e| StoreError::from_io(id.file_name(), e))?;
        Ok(text.replace("\r\n", "\n"))
    }

    fn write(&mut self, id: &ScriptId, text: &str) -> Result<(), StoreError> {
        fs::write(self.path_of(id), text).map_err(|e| StoreError::from_io(id.file_name(), e))
    }

    fn create(&mut self, id: &ScriptId) -> Result<(), StoreError> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path_of(id))
            .map(|_| ())
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => StoreError::MissingDirectory {
                    dir: self.root.display().to_string(),
                },
                _ => StoreError::from_io(id.file_name(), e),
            })
    }

    fn delete(&mut self, id: &ScriptId) -> Result<(), StoreError> {
        fs::remove_file(self.path_of(id)).map_err(|e| StoreError::from_io(id.file_name(), e))
    }

    fn path_of(&self, id: &ScriptId) -> PathBuf {
        self.root.join(id.file_name())
    }
}
