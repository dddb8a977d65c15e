//! FFmpeg-process engine implementation.
//!
//! The virtual filesystem is a private directory on the host and every
//! command runs as a child `ffmpeg` process whose working directory is that
//! root, so virtual paths passed in arguments resolve unchanged.

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, warn};

use super::config::EngineConfig;
use super::error::EngineError;
use super::traits::Engine;
use super::types::{DirEntry, EngineEvent, LoadConfig, LogEvent, MountFile, ProgressEvent};

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Duration: (\d+):(\d{2}):(\d{2}(?:\.\d+)?)").unwrap());

static PROGRESS_KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_]+=\S*$").unwrap());

/// Arguments prepended to every command.
const BASE_ARGS: &[&str] = &["-hide_banner", "-nostdin", "-nostats", "-y", "-progress", "pipe:2"];

/// Classification of one stderr line.
#[derive(Debug, PartialEq)]
enum ParsedLine {
    Log(String),
    Progress(ProgressEvent),
    Ignored,
}

/// Turns ffmpeg stderr (log lines interleaved with `-progress` blocks) into
/// engine events.
#[derive(Debug, Default)]
struct ProgressParser {
    duration_us: Option<u64>,
    last_time_us: u64,
}

impl ProgressParser {
    fn parse(&mut self, line: &str) -> ParsedLine {
        let line = line.trim_end();

        if let Some(caps) = DURATION_RE.captures(line) {
            let hours = caps[1].parse::<f64>().unwrap_or(0.0);
            let minutes = caps[2].parse::<f64>().unwrap_or(0.0);
            let seconds = caps[3].parse::<f64>().unwrap_or(0.0);
            let total = (hours * 3600.0 + minutes * 60.0 + seconds) * 1_000_000.0;
            // Only the first input's duration counts
            if self.duration_us.is_none() {
                self.duration_us = Some(total as u64);
            }
            return ParsedLine::Log(line.to_string());
        }

        if let Some(value) = line.strip_prefix("out_time_ms=") {
            // Despite the name, ffmpeg reports microseconds here
            let Ok(time_us) = value.parse::<u64>() else {
                return ParsedLine::Ignored;
            };
            self.last_time_us = time_us;
            let progress = match self.duration_us {
                Some(duration) if duration > 0 => (time_us as f64 / duration as f64).min(1.0),
                _ => 0.0,
            };
            return ParsedLine::Progress(ProgressEvent { progress, time_us });
        }

        if line == "progress=end" {
            return ParsedLine::Progress(ProgressEvent {
                progress: 1.0,
                time_us: self.last_time_us,
            });
        }

        if line.is_empty() || PROGRESS_KEY_RE.is_match(line) {
            return ParsedLine::Ignored;
        }

        ParsedLine::Log(line.to_string())
    }
}

/// Engine that runs a host `ffmpeg` binary against a private directory.
pub struct FfmpegEngine {
    config: EngineConfig,
    events: broadcast::Sender<EngineEvent>,
    loaded: AtomicBool,
    terminated: AtomicBool,
    terminate_signal: Notify,
    mounts: Mutex<HashMap<PathBuf, Vec<PathBuf>>>,
}

impl FfmpegEngine {
    /// Creates a new FFmpeg engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            events,
            loaded: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            terminate_signal: Notify::new(),
            mounts: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    fn emit(&self, event: EngineEvent) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.events.send(event);
    }

    fn ensure_ready(&self) -> Result<(), EngineError> {
        if self.terminated.load(Ordering::SeqCst) {
            return Err(EngineError::Terminated);
        }
        if !self.loaded.load(Ordering::SeqCst) {
            return Err(EngineError::NotLoaded);
        }
        Ok(())
    }

    /// Maps a virtual path onto the scratch root, rejecting escapes.
    fn resolve(&self, path: &str) -> Result<PathBuf, EngineError> {
        let mut resolved = self.config.scratch_root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(EngineError::InvalidPath {
                        path: path.to_string(),
                    })
                }
            }
        }
        Ok(resolved)
    }

    fn map_io(path: &str, error: std::io::Error) -> EngineError {
        if error.kind() == std::io::ErrorKind::NotFound {
            EngineError::NotFound {
                path: path.to_string(),
            }
        } else {
            EngineError::Io(error)
        }
    }

    #[cfg(test)]
    fn mark_loaded(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Engine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn load(&self, config: &LoadConfig) -> Result<(), EngineError> {
        if self.terminated.load(Ordering::SeqCst) {
            return Err(EngineError::Terminated);
        }

        for url in [&config.core_url, &config.wasm_url] {
            let blob = config
                .urls
                .resolve(url)
                .ok_or_else(|| EngineError::AssetUnavailable {
                    url: url.to_string(),
                })?;
            debug!(url = %url, bytes = blob.data.len(), "Resolved engine asset");
        }

        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(EngineError::exec_failed(format!(
                "ffmpeg -version exited with code: {:?}",
                output.status.code()
            )));
        }

        tokio::fs::create_dir_all(&self.config.scratch_root).await?;
        self.loaded.store(true, Ordering::SeqCst);

        debug!(
            ffmpeg = %self.config.ffmpeg_path.display(),
            root = %self.config.scratch_root.display(),
            "FFmpeg engine loaded"
        );
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    async fn create_dir(&self, path: &str) -> Result<(), EngineError> {
        self.ensure_ready()?;
        let host = self.resolve(path)?;
        tokio::fs::create_dir(&host)
            .await
            .map_err(|e| Self::map_io(path, e))
    }

    async fn delete_dir(&self, path: &str) -> Result<(), EngineError> {
        self.ensure_ready()?;
        let host = self.resolve(path)?;
        tokio::fs::remove_dir(&host)
            .await
            .map_err(|e| Self::map_io(path, e))
    }

    async fn delete_file(&self, path: &str) -> Result<(), EngineError> {
        self.ensure_ready()?;
        let host = self.resolve(path)?;
        tokio::fs::remove_file(&host)
            .await
            .map_err(|e| Self::map_io(path, e))
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, EngineError> {
        self.ensure_ready()?;
        let host = self.resolve(path)?;
        let mut dir = tokio::fs::read_dir(&host)
            .await
            .map_err(|e| Self::map_io(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let is_dir = entry.file_type().await?.is_dir();
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn write_file(&self, path: &str, data: Bytes) -> Result<(), EngineError> {
        self.ensure_ready()?;
        let host = self.resolve(path)?;
        tokio::fs::write(&host, &data)
            .await
            .map_err(|e| Self::map_io(path, e))
    }

    async fn mount(&self, files: &[MountFile], path: &str) -> Result<(), EngineError> {
        self.ensure_ready()?;
        let host_dir = self.resolve(path)?;
        let metadata = tokio::fs::metadata(&host_dir)
            .await
            .map_err(|e| Self::map_io(path, e))?;
        if !metadata.is_dir() {
            return Err(EngineError::NotFound {
                path: path.to_string(),
            });
        }

        let mut written = Vec::with_capacity(files.len());
        for file in files {
            let mut components = Path::new(&file.name).components();
            let valid = matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            );
            if !valid {
                return Err(EngineError::InvalidPath {
                    path: file.name.clone(),
                });
            }

            let target = host_dir.join(&file.name);
            tokio::fs::write(&target, &file.data).await?;
            written.push(target);
        }

        self.mounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(host_dir)
            .or_default()
            .extend(written);
        Ok(())
    }

    async fn unmount(&self, path: &str) -> Result<(), EngineError> {
        self.ensure_ready()?;
        let host_dir = self.resolve(path)?;
        let mounted = self
            .mounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&host_dir)
            .ok_or_else(|| EngineError::NotFound {
                path: path.to_string(),
            })?;

        for file in mounted {
            match tokio::fs::remove_file(&file).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(EngineError::Io(e)),
            }
        }
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Bytes, EngineError> {
        self.ensure_ready()?;
        let host = self.resolve(path)?;
        let data = tokio::fs::read(&host)
            .await
            .map_err(|e| Self::map_io(path, e))?;
        Ok(Bytes::from(data))
    }

    async fn exec(&self, args: &[String]) -> Result<i32, EngineError> {
        self.ensure_ready()?;

        let terminated = self.terminate_signal.notified();
        tokio::pin!(terminated);
        if self.terminated.load(Ordering::SeqCst) {
            return Err(EngineError::Terminated);
        }

        debug!(args = ?args, "Running ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(BASE_ARGS)
            .args(args)
            .current_dir(&self.config.scratch_root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::exec_failed("stderr was not captured"))?;
        let mut stderr = BufReader::new(stderr);
        let mut parser = ProgressParser::default();
        let mut buf = Vec::new();

        let run = async {
            loop {
                buf.clear();
                if stderr.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }
                // Metadata copied from the input is not necessarily UTF-8
                let line = String::from_utf8_lossy(&buf);
                match parser.parse(&line) {
                    ParsedLine::Log(message) => self.emit(EngineEvent::Log(LogEvent { message })),
                    ParsedLine::Progress(progress) => self.emit(EngineEvent::Progress(progress)),
                    ParsedLine::Ignored => {}
                }
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>(status)
        };

        // The child is killed on drop when terminate wins the race
        let status = tokio::select! {
            status = run => status?,
            _ = &mut terminated => {
                warn!("FFmpeg engine terminated during exec");
                return Err(EngineError::Terminated);
            }
        };

        Ok(status.code().unwrap_or(-1))
    }

    fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        self.loaded.store(false, Ordering::SeqCst);
        self.terminate_signal.notify_waiters();
    }
}
