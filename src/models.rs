use std::fmt;

use crate::error::StoreError;

/// Extension every script file carries on disk.
pub const SCRIPT_EXTENSION: &str = "m";

/// Name of a script, unique within the session's list.
///
/// Stored without the extension so `foo` and `foo.m` name the same script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptId(String);

impl ScriptId {
    pub fn new(name: &str) -> Result<Self, StoreError> {
        let trimmed = name.trim();
        let stem = trimmed
            .strip_suffix(".m")
            .unwrap_or(trimmed);

        if stem.is_empty() {
            return Err(StoreError::InvalidName {
                name: name.to_string(),
                reason: "name must not be empty",
            });
        }
        if stem.contains(['/', '\\']) {
            return Err(StoreError::InvalidName {
                name: name.to_string(),
                reason: "name must not contain path separators",
            });
        }

        Ok(Self(stem.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, SCRIPT_EXTENSION)
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Listed,
    Active,
    /// Backing file was created during this session and never opened yet.
    New,
}

#[derive(Debug, Clone)]
pub struct ScriptRecord {
    pub id: ScriptId,
    pub state: RecordState,
}

impl ScriptRecord {
    pub fn listed(id: ScriptId) -> Self {
        Self {
            id,
            state: RecordState::Listed,
        }
    }
}

/// Outcome of one interpreter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    Success { stdout: String },
    Failure { stderr: String },
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success { .. })
    }

    pub fn text(&self) -> &str {
        match self {
            RunResult::Success { stdout } => stdout,
            RunResult::Failure { stderr } => stderr,
        }
    }
}

/// Zero-based position inside the editing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Scripts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    NewScriptName,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Error,
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_id_strips_extension_and_whitespace() {
        let id = ScriptId::new("  budget.m ").unwrap();
        assert_eq!(id.as_str(), "budget");
        assert_eq!(id.file_name(), "budget.m");
        assert_eq!(id, ScriptId::new("budget").unwrap());
    }

    #[test]
    fn script_id_rejects_empty_and_paths() {
        assert!(matches!(
            ScriptId::new("   "),
            Err(StoreError::InvalidName { .. })
        ));
        assert!(matches!(
            ScriptId::new(".m"),
            Err(StoreError::InvalidName { .. })
        ));
        assert!(matches!(
            ScriptId::new("../escape"),
            Err(StoreError::InvalidName { .. })
        ));
    }

    #[test]
    fn run_result_text_picks_populated_channel() {
        let ok = RunResult::Success {
            stdout: "a = 1".into(),
        };
        let err = RunResult::Failure {
            stderr: "boom".into(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.text(), "a = 1");
        assert!(!err.is_success());
        assert_eq!(err.text(), "boom");
    }
}
