//! The converter: one engine instance driven through conversion requests.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use super::config::SetupOptions;
use super::error::{ConvertError, SetupError};
use super::listeners::{ListenerId, ListenerSet, ProgressListener};
use super::staging::{stager_for, InputStager};
use super::types::{ConversionJob, InputFile, OutputFile, INPUT_DIR};
use crate::assets::{AssetSource, ObjectUrl, ObjectUrlStore, CORE_ASSET_PATH, WASM_ASSET_PATH};
use crate::engine::{Engine, EngineError, EngineEvent, LoadConfig};
use crate::metrics::{self, ASSET_FETCHES, CLEANUP_FAILURES};
use crate::registry::Format;

/// Tracing target for forwarded engine log lines.
pub const ENGINE_LOG_TARGET: &str = "local_converter::engine";

/// A ready converter.
///
/// Obtained from [`Converter::setup`] and consumed by [`Converter::release`],
/// so an instance can neither run before its engine is loaded nor after it
/// is terminated. Conversions on one instance run one at a time.
///
/// Dropping a converter without calling `release` still terminates the
/// engine and stops event dispatch.
pub struct Converter {
    engine: Arc<dyn Engine>,
    stager: Arc<dyn InputStager>,
    listeners: ListenerSet,
    urls: ObjectUrlStore,
    core_url: ObjectUrl,
    wasm_url: ObjectUrl,
    dispatcher: JoinHandle<()>,
    exec_lock: Arc<Mutex<()>>,
}

impl Converter {
    /// Fetches the engine assets, creates local references to them and loads
    /// the engine. Nothing is left behind on failure.
    pub async fn setup(
        engine: Arc<dyn Engine>,
        assets: &dyn AssetSource,
        options: SetupOptions,
    ) -> Result<Self, SetupError> {
        let core = fetch_asset(assets, CORE_ASSET_PATH).await?;
        let wasm = fetch_asset(assets, WASM_ASSET_PATH).await?;

        let urls = ObjectUrlStore::new();
        let core_url = urls.create(core, "text/javascript");
        let wasm_url = urls.create(wasm, "application/wasm");

        let listeners = ListenerSet::new();
        let dispatcher = tokio::spawn(dispatch_events(
            engine.subscribe(),
            listeners.clone(),
            options.print_log,
        ));

        let load_config = LoadConfig {
            core_url: core_url.clone(),
            wasm_url: wasm_url.clone(),
            urls: urls.clone(),
        };
        if let Err(e) = engine.load(&load_config).await {
            dispatcher.abort();
            urls.revoke(&core_url);
            urls.revoke(&wasm_url);
            return Err(SetupError::EngineLoad(e));
        }

        info!(
            engine = engine.name(),
            staging = ?options.staging,
            print_log = options.print_log,
            "Converter ready"
        );

        Ok(Self {
            engine,
            stager: stager_for(options.staging),
            listeners,
            urls,
            core_url,
            wasm_url,
            dispatcher,
            exec_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Attaches a progress listener.
    pub fn register_progress_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    /// Detaches a progress listener. Unknown ids are ignored.
    pub fn unregister_progress_listener(&self, id: ListenerId) {
        if !self.listeners.unregister(id) {
            debug!(?id, "Progress listener was not registered");
        }
    }

    /// Registry holding this converter's asset references.
    pub fn object_urls(&self) -> &ObjectUrlStore {
        &self.urls
    }

    /// Converts `input` into files of `output_mime`.
    pub async fn execute(
        &self,
        input: InputFile,
        output_mime: &str,
    ) -> Result<Vec<OutputFile>, ConvertError> {
        let start = Instant::now();

        let Some(input_format) = Format::resolve_mime(&input.mime) else {
            debug!(mime = %input.mime, "Rejecting unsupported input type");
            metrics::record_conversion("unsupported_format", start.elapsed().as_secs_f64(), 0);
            return Err(ConvertError::UnsupportedFormat { mime: input.mime });
        };

        let Some(output_format) = Format::resolve_mime(output_mime) else {
            warn!(mime = %output_mime, "Unknown output type");
            metrics::record_conversion("execution_error", start.elapsed().as_secs_f64(), 0);
            return Err(ConvertError::execution(format!(
                "unknown output type: {}",
                output_mime
            )));
        };

        let guard = Arc::clone(&self.exec_lock).lock_owned().await;
        let job = ConversionJob::new(&input.name, input_format, output_format);
        let span = info_span!(
            "convert",
            scratch = %job.scratch_dir,
            input = %input_format,
            output = %output_format,
            split = job.split,
        );

        // Detached so a dropped caller cannot skip cleanup. The task keeps
        // the lock until the scratch directory is gone.
        let task = tokio::spawn(
            run_and_clean(
                Arc::clone(&self.engine),
                Arc::clone(&self.stager),
                guard,
                job,
                input,
                start,
            )
            .instrument(span),
        );

        match task.await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Conversion task failed");
                metrics::record_conversion("execution_error", start.elapsed().as_secs_f64(), 0);
                Err(ConvertError::execution(format!("conversion task failed: {}", e)))
            }
        }
    }

    /// Terminates the engine and revokes both asset references. Dropping the
    /// converter does the same, silently.
    pub fn release(self) {
        info!(engine = self.engine.name(), "Converter released");
    }
}

impl Drop for Converter {
    fn drop(&mut self) {
        self.dispatcher.abort();
        self.engine.terminate();
        self.urls.revoke(&self.core_url);
        self.urls.revoke(&self.wasm_url);
    }
}

async fn run_and_clean(
    engine: Arc<dyn Engine>,
    stager: Arc<dyn InputStager>,
    _guard: OwnedMutexGuard<()>,
    job: ConversionJob,
    input: InputFile,
    start: Instant,
) -> Result<Vec<OutputFile>, ConvertError> {
    let result = run_job(engine.as_ref(), stager.as_ref(), &job, &input).await;
    cleanup(engine.as_ref(), stager.as_ref(), &job).await;

    let elapsed = start.elapsed().as_secs_f64();
    match result {
        Ok(files) => {
            info!(files = files.len(), elapsed_secs = elapsed, "Conversion finished");
            metrics::record_conversion("success", elapsed, files.len());
            Ok(files)
        }
        Err(e) => {
            warn!(error = %e, "Conversion failed");
            metrics::record_conversion("execution_error", elapsed, 0);
            Err(ConvertError::execution(e.to_string()))
        }
    }
}

/// Stages, executes and collects. Any error discards the collected files.
async fn run_job(
    engine: &dyn Engine,
    stager: &dyn InputStager,
    job: &ConversionJob,
    input: &InputFile,
) -> Result<Vec<OutputFile>, EngineError> {
    engine.create_dir(&job.scratch_dir).await?;
    let input_path = stager.stage_input(engine, job, input).await?;

    let command = job.command(&input_path);
    debug!(command = ?command, "Executing");
    let exit_code = engine.exec(&command).await?;
    if exit_code != 0 {
        return Err(EngineError::exec_failed(format!(
            "ffmpeg exited with code: {}",
            exit_code
        )));
    }

    stager.unstage_input(engine, job).await?;

    let mime = job.output_format.mime();
    let mut files = Vec::new();
    for entry in engine.list_dir(&job.scratch_dir).await? {
        if entry.is_dir {
            continue;
        }
        let path = format!("{}/{}", job.scratch_dir, entry.name);
        let data = engine.read_file(&path).await?;
        engine.delete_file(&path).await?;
        files.push(OutputFile {
            name: entry.name,
            mime: mime.to_string(),
            data,
        });
    }

    Ok(files)
}

/// Removes everything under the scratch directory, then the directory.
/// Runs on every exit path; failures are logged, never returned.
async fn cleanup(engine: &dyn Engine, stager: &dyn InputStager, job: &ConversionJob) {
    let entries = match engine.list_dir(&job.scratch_dir).await {
        Ok(entries) => entries,
        // Never created
        Err(EngineError::NotFound { .. }) => return,
        Err(e) => {
            warn!(error = %e, "Failed to list scratch directory");
            CLEANUP_FAILURES.inc();
            return;
        }
    };

    let mut clean = true;
    if entries.iter().any(|e| e.is_dir && e.name == INPUT_DIR) {
        if let Err(e) = stager.unstage_input(engine, job).await {
            warn!(error = %e, "Failed to unstage input");
            clean = false;
        }
    }

    for entry in entries.iter().filter(|e| !e.is_dir) {
        let path = format!("{}/{}", job.scratch_dir, entry.name);
        if let Err(e) = engine.delete_file(&path).await {
            warn!(path = %path, error = %e, "Failed to delete scratch file");
            clean = false;
        }
    }

    if let Err(e) = engine.delete_dir(&job.scratch_dir).await {
        warn!(error = %e, "Failed to delete scratch directory");
        clean = false;
    }

    if !clean {
        CLEANUP_FAILURES.inc();
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("engine", &self.engine.name())
            .field("staging", &self.stager.mode())
            .field("listeners", &self.listeners)
            .finish()
    }
}

async fn fetch_asset(
    assets: &dyn AssetSource,
    path: &str,
) -> Result<bytes::Bytes, SetupError> {
    match assets.fetch(path).await {
        Ok(data) => {
            ASSET_FETCHES
                .with_label_values(&[assets.name(), "success"])
                .inc();
            debug!(source = assets.name(), path, bytes = data.len(), "Fetched engine asset");
            Ok(data)
        }
        Err(source) => {
            ASSET_FETCHES
                .with_label_values(&[assets.name(), "error"])
                .inc();
            Err(SetupError::AssetFetch {
                path: path.to_string(),
                source,
            })
        }
    }
}

/// Forwards engine events until the engine's channel closes or the task is
/// aborted by `release`.
async fn dispatch_events(
    mut events: broadcast::Receiver<EngineEvent>,
    listeners: ListenerSet,
    print_log: bool,
) {
    loop {
        match events.recv().await {
            Ok(EngineEvent::Progress(progress)) => listeners.notify(&progress),
            Ok(EngineEvent::Log(log)) => {
                if print_log {
                    info!(target: ENGINE_LOG_TARGET, "{}", log.message);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Engine event dispatcher lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
