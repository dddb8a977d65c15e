//! Mock engine for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::engine::{
    DirEntry, Engine, EngineError, EngineEvent, LoadConfig, LogEvent, MountFile, ProgressEvent,
};

/// A recorded engine call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Load,
    CreateDir { path: String },
    DeleteDir { path: String },
    DeleteFile { path: String },
    ListDir { path: String },
    WriteFile { path: String, size: usize },
    Mount { path: String, files: Vec<String> },
    Unmount { path: String },
    ReadFile { path: String },
    Exec { args: Vec<String> },
    Terminate,
}

#[derive(Debug, Default)]
struct MockFs {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Bytes>,
    mounts: HashMap<String, Vec<String>>,
}

impl MockFs {
    fn dir_exists(&self, path: &str) -> bool {
        path.is_empty() || self.dirs.contains(path)
    }

    fn children(&self, path: &str) -> Vec<DirEntry> {
        let dirs = self
            .dirs
            .iter()
            .filter(|d| parent_of(d) == path)
            .map(|d| DirEntry {
                name: base_name(d).to_string(),
                is_dir: true,
            });
        let files = self
            .files
            .keys()
            .filter(|f| parent_of(f) == path)
            .map(|f| DirEntry {
                name: base_name(f).to_string(),
                is_dir: false,
            });
        let mut entries: Vec<DirEntry> = dirs.chain(files).collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

#[derive(Debug)]
struct MockState {
    fs: MockFs,
    calls: Vec<EngineCall>,
    loaded: bool,
    terminated: bool,
    load_error: bool,
    exec_error: Option<String>,
    exit_code: i32,
    frame_count: usize,
    stage_error: Option<String>,
    /// 1-based `read_file` call that fails, counted from `reads`.
    read_error_at: Option<usize>,
    reads: usize,
}

/// In-memory implementation of the [`Engine`] trait.
///
/// Provides controllable behavior for testing:
/// - Track every call for assertions
/// - Inspect the virtual filesystem
/// - Simulate load failures, exec failures and non-zero exit codes
/// - Simulate staging failures (`write_file`, `mount`) and a failing
///   `read_file` partway through output collection
/// - Choose how many frames a split conversion writes
///
/// `exec` reads the input named after `-i`, emits a log line and progress
/// events, then writes the output named by the last argument. A `%05d`
/// placeholder in the output is expanded once per frame and `%%` becomes
/// `%`, as in an image sequence pattern.
///
/// # Example
///
/// ```rust,ignore
/// use local_converter_core::testing::{MockEngine, MemoryAssetSource};
///
/// let engine = Arc::new(MockEngine::new());
/// engine.set_frame_count(3);
///
/// let converter = Converter::setup(engine.clone(), &MemoryAssetSource::with_engine_assets(), SetupOptions::default()).await?;
/// let files = converter.execute(gif, "image/png").await?;
/// assert_eq!(files.len(), 3);
/// assert!(engine.paths().is_empty());
/// ```
#[derive(Debug)]
pub struct MockEngine {
    state: Mutex<MockState>,
    events: broadcast::Sender<EngineEvent>,
    exec_delay: Mutex<Duration>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a mock engine that still needs `load`.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(MockState {
                fs: MockFs::default(),
                calls: Vec::new(),
                loaded: false,
                terminated: false,
                load_error: false,
                exec_error: None,
                exit_code: 0,
                frame_count: 1,
                stage_error: None,
                read_error_at: None,
                reads: 0,
            }),
            events,
            exec_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Create a mock engine that is already loaded.
    pub fn loaded() -> Self {
        let engine = Self::new();
        engine.state().loaded = true;
        engine
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state().calls.clone()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Number of `exec` calls performed.
    pub fn exec_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, EngineCall::Exec { .. }))
            .count()
    }

    /// Contents of a file in the virtual filesystem.
    pub fn file(&self, path: &str) -> Option<Bytes> {
        self.state().fs.files.get(path).cloned()
    }

    /// Whether a directory exists in the virtual filesystem.
    pub fn has_dir(&self, path: &str) -> bool {
        self.state().fs.dirs.contains(path)
    }

    /// Every directory and file currently in the virtual filesystem.
    pub fn paths(&self) -> Vec<String> {
        let state = self.state();
        state
            .fs
            .dirs
            .iter()
            .chain(state.fs.files.keys())
            .cloned()
            .collect()
    }

    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    pub fn is_terminated(&self) -> bool {
        self.state().terminated
    }

    /// Make the next `load` calls fail.
    pub fn set_load_error(&self, fail: bool) {
        self.state().load_error = fail;
    }

    /// Make `exec` fail with `reason` before producing an exit code.
    pub fn set_exec_error(&self, reason: Option<&str>) {
        self.state().exec_error = reason.map(str::to_string);
    }

    /// Exit code returned by `exec`. Non-zero exits write no output.
    pub fn set_exit_code(&self, code: i32) {
        self.state().exit_code = code;
    }

    /// Number of files written for a `%05d` output pattern.
    pub fn set_frame_count(&self, frames: usize) {
        self.state().frame_count = frames;
    }

    /// Make `write_file` and `mount` fail with `reason`.
    pub fn set_stage_error(&self, reason: Option<&str>) {
        self.state().stage_error = reason.map(str::to_string);
    }

    /// Make the `nth` `read_file` call from now on fail (1-based). Later
    /// reads succeed again.
    pub fn set_read_error_on(&self, nth: usize) {
        let mut state = self.state();
        state.read_error_at = Some(nth);
        state.reads = 0;
    }

    /// Simulated `exec` duration.
    pub fn set_exec_delay(&self, delay: Duration) {
        *self.exec_delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Seed a file outside of any engine call.
    pub fn insert_file(&self, path: &str, data: impl Into<Bytes>) {
        self.state().fs.files.insert(normalize(path), data.into());
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

fn base_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

fn not_found(path: &str) -> EngineError {
    EngineError::NotFound {
        path: path.to_string(),
    }
}

fn io_error(kind: std::io::ErrorKind, message: String) -> EngineError {
    EngineError::Io(std::io::Error::new(kind, message))
}

/// Expands an image sequence pattern for `frame`. `None` when the pattern
/// has no frame placeholder.
fn expand_frame_pattern(pattern: &str, frame: usize) -> Option<String> {
    let mut expanded = String::with_capacity(pattern.len() + 5);
    let mut rest = pattern;
    let mut has_placeholder = false;
    while let Some(i) = rest.find('%') {
        expanded.push_str(&rest[..i]);
        let tail = &rest[i..];
        if let Some(after) = tail.strip_prefix("%%") {
            expanded.push('%');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("%05d") {
            expanded.push_str(&format!("{:05}", frame));
            has_placeholder = true;
            rest = after;
        } else {
            expanded.push('%');
            rest = &tail[1..];
        }
    }
    expanded.push_str(rest);
    has_placeholder.then_some(expanded)
}

/// Records the call and checks the engine is usable.
fn begin(state: &mut MockState, call: EngineCall) -> Result<(), EngineError> {
    state.calls.push(call);
    if state.terminated {
        return Err(EngineError::Terminated);
    }
    if !state.loaded {
        return Err(EngineError::NotLoaded);
    }
    Ok(())
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load(&self, config: &LoadConfig) -> Result<(), EngineError> {
        let mut state = self.state();
        state.calls.push(EngineCall::Load);
        if state.terminated {
            return Err(EngineError::Terminated);
        }
        if state.load_error {
            return Err(EngineError::AssetUnavailable {
                url: config.core_url.to_string(),
            });
        }
        for url in [&config.core_url, &config.wasm_url] {
            if config.urls.resolve(url).is_none() {
                return Err(EngineError::AssetUnavailable {
                    url: url.to_string(),
                });
            }
        }
        state.loaded = true;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    async fn create_dir(&self, path: &str) -> Result<(), EngineError> {
        let path = normalize(path);
        let mut state = self.state();
        begin(&mut state, EngineCall::CreateDir { path: path.clone() })?;
        if !state.fs.dir_exists(parent_of(&path)) {
            return Err(not_found(&path));
        }
        if state.fs.dir_exists(&path) || state.fs.files.contains_key(&path) {
            return Err(io_error(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", path),
            ));
        }
        state.fs.dirs.insert(path);
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> Result<(), EngineError> {
        let path = normalize(path);
        let mut state = self.state();
        begin(&mut state, EngineCall::DeleteDir { path: path.clone() })?;
        if !state.fs.dirs.contains(&path) {
            return Err(not_found(&path));
        }
        if !state.fs.children(&path).is_empty() {
            return Err(io_error(
                std::io::ErrorKind::Other,
                format!("directory not empty: {}", path),
            ));
        }
        state.fs.dirs.remove(&path);
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<(), EngineError> {
        let path = normalize(path);
        let mut state = self.state();
        begin(&mut state, EngineCall::DeleteFile { path: path.clone() })?;
        state
            .fs
            .files
            .remove(&path)
            .map(|_| ())
            .ok_or_else(|| not_found(&path))
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, EngineError> {
        let path = normalize(path);
        let mut state = self.state();
        begin(&mut state, EngineCall::ListDir { path: path.clone() })?;
        if !state.fs.dir_exists(&path) {
            return Err(not_found(&path));
        }
        Ok(state.fs.children(&path))
    }

    async fn write_file(&self, path: &str, data: Bytes) -> Result<(), EngineError> {
        let path = normalize(path);
        let mut state = self.state();
        begin(
            &mut state,
            EngineCall::WriteFile {
                path: path.clone(),
                size: data.len(),
            },
        )?;
        if let Some(reason) = state.stage_error.clone() {
            return Err(io_error(std::io::ErrorKind::Other, reason));
        }
        if !state.fs.dir_exists(parent_of(&path)) {
            return Err(not_found(&path));
        }
        state.fs.files.insert(path, data);
        Ok(())
    }

    async fn mount(&self, files: &[MountFile], path: &str) -> Result<(), EngineError> {
        let path = normalize(path);
        let mut state = self.state();
        begin(
            &mut state,
            EngineCall::Mount {
                path: path.clone(),
                files: files.iter().map(|f| f.name.clone()).collect(),
            },
        )?;
        if let Some(reason) = state.stage_error.clone() {
            return Err(io_error(std::io::ErrorKind::Other, reason));
        }
        if !state.fs.dirs.contains(&path) {
            return Err(not_found(&path));
        }
        let mut mounted = Vec::with_capacity(files.len());
        for file in files {
            let file_path = format!("{}/{}", path, file.name);
            state.fs.files.insert(file_path.clone(), file.data.clone());
            mounted.push(file_path);
        }
        state.fs.mounts.insert(path, mounted);
        Ok(())
    }

    async fn unmount(&self, path: &str) -> Result<(), EngineError> {
        let path = normalize(path);
        let mut state = self.state();
        begin(&mut state, EngineCall::Unmount { path: path.clone() })?;
        let mounted = state
            .fs
            .mounts
            .remove(&path)
            .ok_or_else(|| not_found(&path))?;
        for file in mounted {
            state.fs.files.remove(&file);
        }
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Bytes, EngineError> {
        let path = normalize(path);
        let mut state = self.state();
        begin(&mut state, EngineCall::ReadFile { path: path.clone() })?;
        state.reads += 1;
        if state.read_error_at == Some(state.reads) {
            return Err(io_error(
                std::io::ErrorKind::Other,
                format!("read failed: {}", path),
            ));
        }
        state
            .fs
            .files
            .get(&path)
            .cloned()
            .ok_or_else(|| not_found(&path))
    }

    async fn exec(&self, args: &[String]) -> Result<i32, EngineError> {
        {
            let mut state = self.state();
            begin(
                &mut state,
                EngineCall::Exec {
                    args: args.to_vec(),
                },
            )?;
        }

        self.emit(EngineEvent::Log(LogEvent {
            message: format!("mock exec: {}", args.join(" ")),
        }));

        let delay = *self.exec_delay.lock().unwrap_or_else(PoisonError::into_inner);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.terminated {
            return Err(EngineError::Terminated);
        }
        if let Some(reason) = state.exec_error.clone() {
            return Err(EngineError::exec_failed(reason));
        }

        let input = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))
            .map(|p| normalize(p))
            .ok_or_else(|| EngineError::exec_failed("missing input"))?;
        let input_data = state
            .fs
            .files
            .get(&input)
            .cloned()
            .ok_or_else(|| EngineError::exec_failed(format!("{}: No such file", input)))?;

        if state.exit_code != 0 {
            return Ok(state.exit_code);
        }

        let output = args
            .last()
            .map(|p| normalize(p))
            .ok_or_else(|| EngineError::exec_failed("missing output"))?;
        if !state.fs.dir_exists(parent_of(&output)) {
            return Err(EngineError::exec_failed(format!(
                "{}: No such file or directory",
                output
            )));
        }

        let outputs: Vec<String> = if expand_frame_pattern(&output, 1).is_some() {
            (1..=state.frame_count)
                .filter_map(|frame| expand_frame_pattern(&output, frame))
                .collect()
        } else {
            vec![output]
        };
        for path in outputs {
            state.fs.files.insert(path, input_data.clone());
        }
        drop(state);

        for progress in [0.5, 1.0] {
            self.emit(EngineEvent::Progress(ProgressEvent {
                progress,
                time_us: (progress * 1_000_000.0) as u64,
            }));
        }
        Ok(0)
    }

    fn terminate(&self) {
        let mut state = self.state();
        state.calls.push(EngineCall::Terminate);
        state.terminated = true;
    }
}
