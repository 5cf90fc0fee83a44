//! The active-document state machine.
//!
//! A `ScriptSession` owns the script list, the store, the interpreter runner
//! and the editor surface. Every user or timer notification enters through one
//! of its methods and runs to completion before the next one is handled, so at
//! most one interpreter run is ever in flight.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::{
    debounce::Debouncer,
    error::StoreError,
    locator::locate,
    models::{ErrorLocation, LogLevel, RecordState, RunResult, ScriptId, ScriptRecord},
    runner::Runner,
    store::ScriptStore,
};

/// Name of the script created when the directory holds none.
pub const DEFAULT_SCRIPT: &str = "default";

/// What the session needs from the editing UI.
pub trait EditorSurface {
    fn text(&self) -> String;
    fn set_text(&mut self, text: &str);
    fn set_output(&mut self, text: &str);
    fn move_cursor(&mut self, location: ErrorLocation);

    /// Activity messages for the user; ignored unless the surface shows them.
    fn log(&mut self, _level: LogLevel, _message: String) {}
}

pub struct ScriptSession<S, R, E> {
    store: S,
    runner: R,
    surface: E,
    scripts: Vec<ScriptRecord>,
    active: Option<ScriptId>,
    debounce: Debouncer,
}

impl<S: ScriptStore, R: Runner, E: EditorSurface> ScriptSession<S, R, E> {
    /// Builds the script list from the store, creating the default script
    /// when the store is empty. Nothing is selected yet.
    pub fn open(
        mut store: S,
        runner: R,
        surface: E,
        debounce: Duration,
    ) -> Result<Self, StoreError> {
        let mut ids = store.list()?;
        if ids.is_empty() {
            let id = ScriptId::new(DEFAULT_SCRIPT)?;
            match store.create(&id) {
                Ok(()) | Err(StoreError::AlreadyExists { .. }) => {}
                Err(e) => return Err(e),
            }
            info!(script = %id, "Created default script");
            ids.push(id);
        }

        let mut session = Self {
            store,
            runner,
            surface,
            scripts: ids.into_iter().map(ScriptRecord::listed).collect(),
            active: None,
            debounce: Debouncer::new(debounce),
        };
        let count = session.scripts.len();
        session
            .surface
            .log(LogLevel::Info, format!("Found {} scripts", count));
        Ok(session)
    }

    pub fn scripts(&self) -> &[ScriptRecord] {
        &self.scripts
    }

    pub fn active(&self) -> Option<&ScriptId> {
        self.active.as_ref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let active = self.active.as_ref()?;
        self.position(active)
    }

    pub fn surface(&self) -> &E {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut E {
        &mut self.surface
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn run_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Reacts to the list selection moving to `index` (or to nothing).
    pub fn select(&mut self, index: Option<usize>) {
        let Some(id) = index.and_then(|i| self.scripts.get(i)).map(|r| r.id.clone()) else {
            self.select_none();
            return;
        };

        match self.active.clone() {
            None => self.select_first_time(id),
            Some(old) if old == id => {}
            Some(old) => self.switch_selection(old, id),
        }
    }

    /// Saves the active script, if any, and empties the editor.
    /// A failed save keeps the script selected and the buffer untouched.
    pub fn select_none(&mut self) {
        if let Some(old) = self.active.clone() {
            if !self.save_or_report(&old) {
                return;
            }
            self.set_state(&old, RecordState::Listed);
            self.active = None;
            info!(script = %old, "Selection cleared");
        }
        self.debounce.cancel();
        self.surface.set_text("");
        self.surface.set_output("");
    }

    /// Loads and runs `id` when nothing was selected before.
    pub fn select_first_time(&mut self, id: ScriptId) {
        if let Some(old) = self.active.clone() {
            self.switch_selection(old, id);
            return;
        }
        self.load_and_run(id);
    }

    /// Saves `old`, then loads and runs `new`. If `old` cannot be saved the
    /// switch is abandoned and `old` stays selected with its edits.
    pub fn switch_selection(&mut self, old: ScriptId, new: ScriptId) {
        if !self.save_or_report(&old) {
            return;
        }
        self.debounce.cancel();
        self.set_state(&old, RecordState::Listed);
        self.active = None;
        info!(from = %old, to = %new, "Switching script");
        self.load_and_run(new);
    }

    /// Buffer changed: push the auto-run back by one debounce interval.
    pub fn edit(&mut self, now: Instant) {
        if self.active.is_some() {
            self.debounce.arm(now);
        }
    }

    /// Runs the debounced save-and-run if its deadline has passed.
    /// Returns whether a run happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.debounce.fire(now) {
            return false;
        }
        self.debounce_elapsed()
    }

    fn debounce_elapsed(&mut self) -> bool {
        let Some(id) = self.active.clone() else {
            return false;
        };
        debug!(script = %id, "Debounce elapsed");
        self.save_and_run(&id);
        true
    }

    /// Explicit run request from the user.
    pub fn run_requested(&mut self) {
        let Some(id) = self.active.clone() else {
            self.surface.set_output("No script file selected.");
            self.surface
                .log(LogLevel::Warning, "No script file selected".to_string());
            return;
        };
        self.debounce.cancel();
        self.save_and_run(&id);
    }

    /// Selects `name`, adopting or creating its file when it is not listed.
    pub fn create_new(&mut self, name: &str) {
        let id = match ScriptId::new(name) {
            Ok(id) => id,
            Err(e) => {
                self.surface.set_output(&e.to_string());
                return;
            }
        };

        if let Some(index) = self.position(&id) {
            self.select(Some(index));
            return;
        }

        let state = match self.store.create(&id) {
            Ok(()) => {
                info!(script = %id, "Created script");
                self.surface
                    .log(LogLevel::Success, format!("Created {}", id.file_name()));
                RecordState::New
            }
            Err(StoreError::AlreadyExists { .. }) => {
                info!(script = %id, "Adopted existing script file");
                self.surface
                    .log(LogLevel::Info, format!("Added existing {}", id.file_name()));
                RecordState::Listed
            }
            Err(e) => {
                error!(script = %id, error = %e, "Could not create script");
                self.surface.set_output(&format!(
                    "Could not create file '{}': {}",
                    id.file_name(),
                    e
                ));
                return;
            }
        };

        self.scripts.push(ScriptRecord { id, state });
        self.select(Some(self.scripts.len() - 1));
    }

    /// Saves the active script; nothing is run.
    pub fn shutdown(&mut self) {
        self.debounce.cancel();
        if let Some(id) = self.active.clone() {
            self.save_logged(&id);
            info!(script = %id, "Saved on shutdown");
        }
    }

    fn load_and_run(&mut self, id: ScriptId) {
        match self.store.read(&id) {
            Ok(text) => {
                self.surface.set_text(&text);
                if self.state_of(&id) != Some(RecordState::New) {
                    self.set_state(&id, RecordState::Active);
                }
                self.active = Some(id.clone());
                info!(script = %id, "Loaded script");
                self.surface
                    .log(LogLevel::Info, format!("Loaded {}", id.file_name()));
                self.run(&id);
            }
            Err(e) => {
                warn!(script = %id, error = %e, "Load failed, dropping script from list");
                self.active = None;
                self.surface.set_text("");
                self.surface.set_output(&e.to_string());
                self.scripts.retain(|r| r.id != id);
                self.surface
                    .log(LogLevel::Error, format!("Removed {}: {}", id, e));
            }
        }
    }

    fn save_and_run(&mut self, id: &ScriptId) {
        if let Err(e) = self.save(id) {
            error!(script = %id, error = %e, "Save failed, not running");
            self.surface.set_output(&e.to_string());
            self.surface
                .log(LogLevel::Error, format!("Save failed: {}", e));
            return;
        }
        self.run(id);
    }

    fn run(&mut self, id: &ScriptId) {
        let path = self.store.path_of(id);
        let result = self.runner.invoke(&path);
        info!(script = %id, success = result.is_success(), "Run finished");
        self.surface.set_output(result.text());

        let RunResult::Failure { stderr } = &result else {
            self.surface
                .log(LogLevel::Success, format!("Ran {}", id.file_name()));
            return;
        };

        let message = match locate(stderr) {
            Some(location) => {
                self.surface.move_cursor(location);
                format!(
                    "{} failed at line {}, column {}",
                    id.file_name(),
                    location.line + 1,
                    location.column + 1
                )
            }
            None => format!("{} failed", id.file_name()),
        };
        self.surface.log(LogLevel::Warning, message);
    }

    fn save(&mut self, id: &ScriptId) -> Result<(), StoreError> {
        let text = self.surface.text();
        self.store.write(id, &text)?;
        debug!(script = %id, bytes = text.len(), "Saved script");
        if self.state_of(id) == Some(RecordState::New) {
            self.set_state(id, RecordState::Active);
        }
        Ok(())
    }

    fn save_or_report(&mut self, id: &ScriptId) -> bool {
        match self.save(id) {
            Ok(()) => true,
            Err(e) => {
                error!(script = %id, error = %e, "Save failed, keeping script selected");
                self.surface.set_output(&e.to_string());
                self.surface
                    .log(LogLevel::Error, format!("Save failed: {}", e));
                false
            }
        }
    }

    fn save_logged(&mut self, id: &ScriptId) {
        if let Err(e) = self.save(id) {
            error!(script = %id, error = %e, "Save failed");
            self.surface
                .log(LogLevel::Error, format!("Save failed: {}", e));
        }
    }

    fn position(&self, id: &ScriptId) -> Option<usize> {
        self.scripts.iter().position(|r| &r.id == id)
    }

    fn state_of(&self, id: &ScriptId) -> Option<RecordState> {
        self.scripts.iter().find(|r| &r.id == id).map(|r| r.state)
    }

    fn set_state(&mut self, id: &ScriptId, state: RecordState) {
        if let Some(record) = self.scripts.iter_mut().find(|r| &r.id == id) {
            record.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    };

    const DEBOUNCE: Duration = Duration::from_secs(1);

    #[derive(Default)]
    struct MemoryStore {
        files: BTreeMap<String, String>,
        writes: Vec<(String, String)>,
        deny_create: bool,
        deny_write: bool,
    }

    impl MemoryStore {
        fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            }
        }

        fn get(&self, name: &str) -> Option<&str> {
            self.files.get(name).map(String::as_str)
        }
    }

    impl ScriptStore for MemoryStore {
        fn list(&self) -> Result<Vec<ScriptId>, StoreError> {
            Ok(self.files.keys().map(|k| ScriptId::new(k).unwrap()).collect())
        }

        fn read(&self, id: &ScriptId) -> Result<String, StoreError> {
            self.files
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    file: id.file_name(),
                })
        }

        fn write(&mut self, id: &ScriptId, text: &str) -> Result<(), StoreError> {
            if self.deny_write {
                return Err(StoreError::Denied {
                    file: id.file_name(),
                });
            }
            self.writes.push((id.to_string(), text.to_string()));
            self.files.insert(id.to_string(), text.to_string());
            Ok(())
        }

        fn create(&mut self, id: &ScriptId) -> Result<(), StoreError> {
            if self.files.contains_key(id.as_str()) {
                return Err(StoreError::AlreadyExists {
                    file: id.file_name(),
                });
            }
            if self.deny_create {
                return Err(StoreError::Denied {
                    file: id.file_name(),
                });
            }
            self.files.insert(id.to_string(), String::new());
            Ok(())
        }

        fn delete(&mut self, id: &ScriptId) -> Result<(), StoreError> {
            self.files
                .remove(id.as_str())
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound {
                    file: id.file_name(),
                })
        }

        fn path_of(&self, id: &ScriptId) -> PathBuf {
            PathBuf::from(id.file_name())
        }
    }

    /// Answers every run with a fixed result and records the script paths.
    struct FakeRunner {
        reply: RunResult,
        calls: Vec<PathBuf>,
    }

    impl FakeRunner {
        fn ok(stdout: &str) -> Self {
            Self {
                reply: RunResult::Success {
                    stdout: stdout.into(),
                },
                calls: Vec::new(),
            }
        }

        fn failing(stderr: &str) -> Self {
            Self {
                reply: RunResult::Failure {
                    stderr: stderr.into(),
                },
                calls: Vec::new(),
            }
        }
    }

    impl Runner for FakeRunner {
        fn invoke(&mut self, script: &Path) -> RunResult {
            self.calls.push(script.to_path_buf());
            self.reply.clone()
        }
    }

    #[derive(Default)]
    struct FakeSurface {
        text: String,
        output: String,
        cursor: Option<ErrorLocation>,
    }

    impl EditorSurface for FakeSurface {
        fn text(&self) -> String {
            self.text.clone()
        }

        fn set_text(&mut self, text: &str) {
            self.text = text.to_string();
        }

        fn set_output(&mut self, text: &str) {
            self.output = text.to_string();
        }

        fn move_cursor(&mut self, location: ErrorLocation) {
            self.cursor = Some(location);
        }
    }

    type TestSession = ScriptSession<MemoryStore, FakeRunner, FakeSurface>;

    fn session(store: MemoryStore, runner: FakeRunner) -> TestSession {
        ScriptSession::open(store, runner, FakeSurface::default(), DEBOUNCE).unwrap()
    }

    fn names(session: &TestSession) -> Vec<String> {
        session.scripts().iter().map(|r| r.id.to_string()).collect()
    }

    fn type_text(session: &mut TestSession, text: &str, now: Instant) {
        session.surface_mut().set_text(text);
        session.edit(now);
    }

    #[test]
    fn empty_store_gets_default_script() {
        let s = session(MemoryStore::default(), FakeRunner::ok(""));

        assert_eq!(names(&s), ["default"]);
        assert_eq!(s.store().get("default"), Some(""));
        assert!(s.active().is_none());
    }

    #[test]
    fn first_selection_loads_and_runs() {
        let store = MemoryStore::with(&[("calc", "a = 1/3")]);
        let mut s = session(store, FakeRunner::ok("a = 0.3333\n"));

        s.select(Some(0));

        assert_eq!(s.active().map(|id| id.as_str()), Some("calc"));
        assert_eq!(s.surface().text, "a = 1/3");
        assert_eq!(s.surface().output, "a = 0.3333\n");
        assert_eq!(s.runner().calls, [PathBuf::from("calc.m")]);
        assert_eq!(s.scripts()[0].state, RecordState::Active);
        assert!(s.store().writes.is_empty());
    }

    #[test]
    fn typing_then_waiting_saves_and_runs() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok("a = 0.3333\n"));
        s.select(Some(0));
        let t0 = Instant::now();

        type_text(&mut s, "a = 1/3", t0);
        assert!(!s.tick(t0 + Duration::from_millis(500)));
        assert!(s.tick(t0 + DEBOUNCE));

        assert_eq!(s.store().get("default"), Some("a = 1/3"));
        assert_eq!(s.surface().output, "a = 0.3333\n");
        assert_eq!(s.runner().calls.len(), 2);
    }

    #[test]
    fn burst_of_edits_collapses_to_one_run() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok("ok"));
        s.select(Some(0));
        let t0 = Instant::now();
        let runs_before = s.runner().calls.len();

        let mut typed = String::new();
        for (i, ch) in "x = 42;".chars().enumerate() {
            typed.push(ch);
            let now = t0 + Duration::from_millis(300) * i as u32;
            type_text(&mut s, &typed, now);
            assert!(!s.tick(now));
        }
        let last = t0 + Duration::from_millis(300) * 6;

        assert!(!s.tick(last + Duration::from_millis(999)));
        assert!(s.tick(last + DEBOUNCE));
        assert!(!s.tick(last + DEBOUNCE * 3));

        assert_eq!(s.runner().calls.len(), runs_before + 1);
        assert_eq!(s.store().writes, [("default".to_string(), "x = 42;".to_string())]);
    }

    #[test]
    fn failed_run_shows_diagnostic_and_moves_cursor() {
        let diag = "parse error near line 1 column 5\n\n>>> x = \n        ^";
        let mut s = session(MemoryStore::default(), FakeRunner::failing(diag));
        s.select(Some(0));
        s.surface_mut().cursor = None;
        let t0 = Instant::now();

        type_text(&mut s, "x = ", t0);
        assert!(s.tick(t0 + DEBOUNCE));

        assert_eq!(s.surface().output, diag);
        assert_eq!(s.surface().cursor, Some(ErrorLocation { line: 0, column: 4 }));
        // a failing run never drops the selection
        assert_eq!(s.active().map(|id| id.as_str()), Some("default"));
        assert_eq!(names(&s), ["default"]);
    }

    #[test]
    fn diagnostic_without_location_leaves_cursor() {
        let mut s = session(MemoryStore::default(), FakeRunner::failing("error: 'q' undefined"));
        s.select(Some(0));
        s.surface_mut().cursor = None;

        s.run_requested();

        assert_eq!(s.surface().output, "error: 'q' undefined");
        assert_eq!(s.surface().cursor, None);
    }

    #[test]
    fn switching_saves_outgoing_before_loading() {
        let store = MemoryStore::with(&[("a", "1"), ("b", "2")]);
        let mut s = session(store, FakeRunner::ok(""));
        s.select(Some(0));
        s.surface_mut().set_text("1 + 1");

        s.select(Some(1));

        assert_eq!(s.store().get("a"), Some("1 + 1"));
        assert_eq!(s.surface().text, "2");
        assert_eq!(s.active().map(|id| id.as_str()), Some("b"));
        assert_eq!(s.scripts()[0].state, RecordState::Listed);
        assert_eq!(s.scripts()[1].state, RecordState::Active);
    }

    #[test]
    fn switching_to_deleted_script_saves_then_purges() {
        let store = MemoryStore::with(&[("a", "1"), ("b", "2")]);
        let mut s = session(store, FakeRunner::ok(""));
        s.select(Some(0));
        s.surface_mut().set_text("edited");
        s.store_mut().delete(&ScriptId::new("b").unwrap()).unwrap();

        s.select(Some(1));

        assert_eq!(s.store().get("a"), Some("edited"));
        assert!(s.active().is_none());
        assert_eq!(names(&s), ["a"]);
        assert_eq!(s.surface().text, "");
        assert_eq!(s.surface().output, "could not find script file 'b.m'");
    }

    #[test]
    fn first_selection_of_deleted_script_reverts_to_none() {
        let store = MemoryStore::with(&[("gone", "x")]);
        let mut s = session(store, FakeRunner::ok(""));
        s.store_mut().delete(&ScriptId::new("gone").unwrap()).unwrap();

        s.select(Some(0));

        assert!(s.active().is_none());
        assert!(s.scripts().is_empty());
        assert!(s.surface().output.contains("gone.m"));
        assert!(s.runner().calls.is_empty());
    }

    #[test]
    fn select_none_saves_and_clears() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok("out"));
        s.select(Some(0));
        s.surface_mut().set_text("y = 2");
        s.edit(Instant::now());

        s.select(None);

        assert_eq!(s.store().get("default"), Some("y = 2"));
        assert!(s.active().is_none());
        assert_eq!(s.surface().text, "");
        assert_eq!(s.surface().output, "");
        assert!(!s.run_pending());
    }

    #[test]
    fn pending_run_does_not_fire_after_switch() {
        let store = MemoryStore::with(&[("a", ""), ("b", "")]);
        let mut s = session(store, FakeRunner::ok(""));
        s.select(Some(0));
        let t0 = Instant::now();
        type_text(&mut s, "z = 3", t0);

        s.select(Some(1));
        let runs = s.runner().calls.len();

        assert!(!s.tick(t0 + DEBOUNCE * 2));
        assert_eq!(s.runner().calls.len(), runs);
        assert_eq!(s.store().get("a"), Some("z = 3"));
        assert_eq!(s.store().get("b"), Some(""));
    }

    #[test]
    fn edit_without_selection_is_ignored() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));
        s.edit(Instant::now());

        assert!(!s.run_pending());
    }

    #[test]
    fn reselecting_active_script_does_nothing() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));
        s.select(Some(0));
        let runs = s.runner().calls.len();

        s.select(Some(0));

        assert_eq!(s.runner().calls.len(), runs);
        assert!(s.store().writes.is_empty());
    }

    #[test]
    fn run_without_selection_reports() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));

        s.run_requested();

        assert_eq!(s.surface().output, "No script file selected.");
        assert!(s.runner().calls.is_empty());
        assert!(s.store().writes.is_empty());
    }

    #[test]
    fn explicit_run_saves_runs_and_cancels_pending() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok("b = 4"));
        s.select(Some(0));
        let t0 = Instant::now();
        type_text(&mut s, "b = 2 * 2", t0);

        s.run_requested();

        assert_eq!(s.store().get("default"), Some("b = 2 * 2"));
        assert_eq!(s.surface().output, "b = 4");
        assert!(!s.tick(t0 + DEBOUNCE));
    }

    #[test]
    fn save_failure_skips_run() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok("out"));
        s.select(Some(0));
        s.store_mut().deny_write = true;
        let runs = s.runner().calls.len();

        s.run_requested();

        assert_eq!(s.runner().calls.len(), runs);
        assert_eq!(s.surface().output, "permission denied for script file 'default.m'");
        assert_eq!(s.active().map(|id| id.as_str()), Some("default"));
    }

    #[test]
    fn create_existing_name_selects_without_writing() {
        let store = MemoryStore::with(&[("a", "1"), ("b", "2")]);
        let mut s = session(store, FakeRunner::ok(""));

        s.create_new("b.m");

        assert_eq!(s.active().map(|id| id.as_str()), Some("b"));
        assert_eq!(names(&s), ["a", "b"]);
        assert!(s.store().writes.is_empty());
    }

    #[test]
    fn create_new_name_makes_empty_file_and_selects() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));
        s.select(Some(0));
        s.surface_mut().set_text("keep");

        s.create_new("fresh");

        assert_eq!(names(&s), ["default", "fresh"]);
        assert_eq!(s.store().get("fresh"), Some(""));
        assert_eq!(s.store().get("default"), Some("keep"));
        assert_eq!(s.active().map(|id| id.as_str()), Some("fresh"));
        assert_eq!(s.selected_index(), Some(1));
        assert_eq!(s.surface().text, "");
    }

    #[test]
    fn new_script_stays_new_until_first_save() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));

        s.create_new("fresh");
        assert_eq!(s.scripts()[1].state, RecordState::New);
        assert_eq!(s.selected_index(), Some(1));

        s.surface_mut().set_text("f = 1");
        s.run_requested();
        assert_eq!(s.scripts()[1].state, RecordState::Active);
    }

    #[test]
    fn switch_with_failed_save_keeps_buffer_and_selection() {
        let store = MemoryStore::with(&[("a", "1"), ("b", "2")]);
        let mut s = session(store, FakeRunner::ok(""));
        s.select(Some(0));
        let t0 = Instant::now();
        type_text(&mut s, "precious edits", t0);
        s.store_mut().deny_write = true;

        s.select(Some(1));

        assert_eq!(s.surface().text, "precious edits");
        assert_eq!(s.active().map(|id| id.as_str()), Some("a"));
        assert_eq!(s.selected_index(), Some(0));
        assert_eq!(s.scripts()[0].state, RecordState::Active);
        assert_eq!(s.scripts()[1].state, RecordState::Listed);
        assert_eq!(s.surface().output, "permission denied for script file 'a.m'");
        assert!(s.run_pending());

        s.store_mut().deny_write = false;
        s.select(Some(1));
        assert_eq!(s.store().get("a"), Some("precious edits"));
        assert_eq!(s.active().map(|id| id.as_str()), Some("b"));
    }

    #[test]
    fn deselect_with_failed_save_keeps_buffer() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));
        s.select(Some(0));
        s.surface_mut().set_text("unsaved");
        s.store_mut().deny_write = true;

        s.select(None);

        assert_eq!(s.surface().text, "unsaved");
        assert_eq!(s.active().map(|id| id.as_str()), Some("default"));
        assert!(s.surface().output.starts_with("permission denied"));
    }

    #[test]
    fn create_adopts_unlisted_file() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));
        s.store_mut()
            .files
            .insert("stray".to_string(), "s = 9".to_string());

        s.create_new("stray");

        assert_eq!(names(&s), ["default", "stray"]);
        assert_eq!(s.surface().text, "s = 9");
        assert_eq!(s.scripts()[1].state, RecordState::Active);
    }

    #[test]
    fn create_failure_reports_and_changes_nothing() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));
        s.select(Some(0));
        s.store_mut().deny_create = true;

        s.create_new("nope");

        assert_eq!(names(&s), ["default"]);
        assert_eq!(s.active().map(|id| id.as_str()), Some("default"));
        assert!(s.surface().output.starts_with("Could not create file 'nope.m'"));
    }

    #[test]
    fn create_with_empty_name_is_rejected() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));

        s.create_new("  ");

        assert_eq!(names(&s), ["default"]);
        assert!(s.surface().output.contains("must not be empty"));
    }

    #[test]
    fn shutdown_saves_without_running() {
        let mut s = session(MemoryStore::default(), FakeRunner::ok(""));
        s.select(Some(0));
        let runs = s.runner().calls.len();
        type_text(&mut s, "final", Instant::now());

        s.shutdown();

        assert_eq!(s.store().get("default"), Some("final"));
        assert_eq!(s.runner().calls.len(), runs);
        assert!(!s.run_pending());
    }
}
