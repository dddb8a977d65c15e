//! A fixed set of converters shared by concurrent callers.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use super::config::SetupOptions;
use super::error::{ConvertError, SetupError};
use super::instance::Converter;
use super::listeners::{ListenerId, ListenerSet, ProgressListener};
use super::types::{InputFile, OutputFile};
use crate::assets::AssetSource;
use crate::engine::{Engine, ProgressEvent};
use crate::metrics::{POOL_ACTIVE, POOL_QUEUED};

/// Runs up to `size` conversions at once, one per converter.
///
/// Each member is an independent [`Converter`] with its own engine, so the
/// per-instance serialization still holds. Progress from every member is
/// forwarded to the listeners registered on the pool.
pub struct ConverterPool {
    idle: Mutex<Vec<Converter>>,
    permits: Semaphore,
    listeners: ListenerSet,
    size: usize,
}

impl ConverterPool {
    /// Sets up `size` converters, each on an engine from `make_engine`.
    ///
    /// Members load concurrently. If any member fails, the members that did
    /// load are released.
    pub async fn setup<F>(
        size: usize,
        mut make_engine: F,
        assets: &dyn AssetSource,
        options: SetupOptions,
    ) -> Result<Self, SetupError>
    where
        F: FnMut() -> Arc<dyn Engine>,
    {
        if size == 0 {
            return Err(SetupError::EmptyPool);
        }

        let engines: Vec<Arc<dyn Engine>> = (0..size).map(|_| make_engine()).collect();
        let results = join_all(
            engines
                .into_iter()
                .map(|engine| Converter::setup(engine, assets, options.clone())),
        )
        .await;

        let mut members = Vec::with_capacity(size);
        let mut first_error = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(converter) => members.push(converter),
                Err(e) => {
                    warn!(index, error = %e, "Pool member setup failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            for converter in members {
                converter.release();
            }
            return Err(e);
        }

        let listeners = ListenerSet::new();
        for converter in &members {
            let forward = listeners.clone();
            converter.register_progress_listener(Arc::new(move |event: &ProgressEvent| {
                forward.notify(event)
            }));
        }

        info!(size, "Converter pool ready");

        Ok(Self {
            idle: Mutex::new(members),
            permits: Semaphore::new(size),
            listeners,
            size,
        })
    }

    /// Number of converters in the pool.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of converters not currently running a conversion.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Attaches a listener receiving progress from every member.
    pub fn register_progress_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    /// Detaches a pool listener. Unknown ids are ignored.
    pub fn unregister_progress_listener(&self, id: ListenerId) {
        if !self.listeners.unregister(id) {
            debug!(?id, "Progress listener was not registered");
        }
    }

    /// Converts on the first free member, waiting if all are busy.
    pub async fn execute(
        &self,
        input: InputFile,
        output_mime: &str,
    ) -> Result<Vec<OutputFile>, ConvertError> {
        let lease = self.checkout().await?;
        lease.converter().execute(input, output_mime).await
    }

    /// Releases every member.
    pub fn release(self) {
        let members = self
            .idle
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        for converter in members {
            converter.release();
        }
        info!(size = self.size, "Converter pool released");
    }

    async fn checkout(&self) -> Result<Lease<'_>, ConvertError> {
        POOL_QUEUED.inc();
        let permit = self.permits.acquire().await;
        POOL_QUEUED.dec();
        let permit =
            permit.map_err(|_| ConvertError::execution("converter pool is closed"))?;

        let converter = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .ok_or_else(|| ConvertError::execution("no idle converter"))?;

        POOL_ACTIVE.inc();
        Ok(Lease {
            pool: self,
            converter: Some(converter),
            _permit: permit,
        })
    }
}

impl std::fmt::Debug for ConverterPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterPool")
            .field("size", &self.size)
            .field("available", &self.available())
            .finish()
    }
}

/// A checked-out converter. Returned to the pool on drop, including when the
/// caller's future is cancelled mid-conversion. An abandoned conversion
/// keeps the converter's lock until its scratch directory is cleaned up, so
/// the next caller on that member waits for it.
struct Lease<'a> {
    pool: &'a ConverterPool,
    converter: Option<Converter>,
    _permit: SemaphorePermit<'a>,
}

impl Lease<'_> {
    fn converter(&self) -> &Converter {
        // Only taken in Drop
        self.converter
            .as_ref()
            .unwrap_or_else(|| unreachable!("lease used after drop"))
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if let Some(converter) = self.converter.take() {
            self.pool
                .idle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(converter);
        }
        POOL_ACTIVE.dec();
    }
}
