use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

/// Optional settings file looked up in the script directory.
pub const SETTINGS_FILE: &str = "scratchpad.json";

#[derive(Parser, Debug, Default)]
#[command(
    name = "octave-scratchpad",
    version,
    about = "Live-reloading editor for Octave scripts"
)]
pub struct Cli {
    /// Directory holding the .m scripts (defaults to the current directory)
    pub dir: Option<PathBuf>,

    /// Interpreter program to run scripts with
    #[arg(long, value_name = "PROGRAM")]
    pub interpreter: Option<String>,

    /// Idle time after the last keystroke before the script is re-run
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Where to write the diagnostic log
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub interpreter: String,
    pub interpreter_args: Vec<String>,
    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interpreter: "octave".to_string(),
            interpreter_args: vec!["--no-gui".to_string(), "-q".to_string()],
            debounce_ms: 1000,
        }
    }
}

impl Settings {
    /// Reads `scratchpad.json` from `dir`, or returns defaults if there is none.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Command-line flags win over the settings file.
    pub fn apply(&mut self, cli: &Cli) {
        if let Some(interpreter) = &cli.interpreter {
            self.interpreter = interpreter.clone();
        }
        if let Some(ms) = cli.debounce_ms {
            self.debounce_ms = ms;
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
