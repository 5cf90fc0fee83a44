use std::io;

use thiserror::Error;

/// Failures of script storage operations, by kind.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not find script file '{file}'")]
    NotFound { file: String },

    #[error("permission denied for script file '{file}'")]
    Denied { file: String },

    #[error("script file '{file}' already exists")]
    AlreadyExists { file: String },

    #[error("script directory '{dir}' does not exist")]
    MissingDirectory { dir: String },

    #[error("invalid script name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("i/o error on script file '{file}': {source}")]
    Io {
        file: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Classifies an I/O error raised while touching `file`.
    pub fn from_io(file: impl Into<String>, source: io::Error) -> Self {
        let file = file.into();
        match source.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound { file },
            io::ErrorKind::PermissionDenied => StoreError::Denied { file },
            io::ErrorKind::AlreadyExists => StoreError::AlreadyExists { file },
            _ => StoreError::Io { file, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kinds_map_to_store_kinds() {
        let not_found = StoreError::from_io("a.m", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(not_found, StoreError::NotFound { ref file } if file == "a.m"));

        let denied = StoreError::from_io("a.m", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, StoreError::Denied { .. }));

        let exists = StoreError::from_io("a.m", io::Error::from(io::ErrorKind::AlreadyExists));
        assert!(matches!(exists, StoreError::AlreadyExists { .. }));

        let other = StoreError::from_io("a.m", io::Error::other("disk on fire"));
        assert!(other.to_string().contains("disk on fire"));
    }
}
