//! Strategies for placing the input file in the engine's filesystem.

use std::sync::Arc;

use async_trait::async_trait;

use super::config::StagingMode;
use super::types::{ConversionJob, InputFile};
use crate::engine::{Engine, EngineError, MountFile};

/// Stages the input before execution and removes it afterwards.
#[async_trait]
pub trait InputStager: Send + Sync {
    fn mode(&self) -> StagingMode;

    /// Makes the input available and returns its virtual path.
    async fn stage_input(
        &self,
        engine: &dyn Engine,
        job: &ConversionJob,
        input: &InputFile,
    ) -> Result<String, EngineError>;

    /// Removes the staged input and its directory. Tolerates partial staging.
    async fn unstage_input(&self, engine: &dyn Engine, job: &ConversionJob)
        -> Result<(), EngineError>;
}

/// Returns the stager for `mode`.
pub fn stager_for(mode: StagingMode) -> Arc<dyn InputStager> {
    match mode {
        StagingMode::Copy => Arc::new(CopyStager),
        StagingMode::Mount => Arc::new(MountStager),
    }
}

fn ignore_missing(result: Result<(), EngineError>) -> Result<(), EngineError> {
    match result {
        Err(EngineError::NotFound { .. }) => Ok(()),
        other => other,
    }
}

/// Copies the input bytes into the scratch directory.
#[derive(Debug, Default)]
pub struct CopyStager;

#[async_trait]
impl InputStager for CopyStager {
    fn mode(&self) -> StagingMode {
        StagingMode::Copy
    }

    async fn stage_input(
        &self,
        engine: &dyn Engine,
        job: &ConversionJob,
        input: &InputFile,
    ) -> Result<String, EngineError> {
        let input_path = job.input_path();
        engine.create_dir(&job.input_dir()).await?;
        engine.write_file(&input_path, input.data.clone()).await?;
        Ok(input_path)
    }

    async fn unstage_input(
        &self,
        engine: &dyn Engine,
        job: &ConversionJob,
    ) -> Result<(), EngineError> {
        ignore_missing(engine.delete_file(&job.input_path()).await)?;
        ignore_missing(engine.delete_dir(&job.input_dir()).await)
    }
}

/// Mounts the input read-only, avoiding a copy where the engine supports it.
#[derive(Debug, Default)]
pub struct MountStager;

#[async_trait]
impl InputStager for MountStager {
    fn mode(&self) -> StagingMode {
        StagingMode::Mount
    }

    async fn stage_input(
        &self,
        engine: &dyn Engine,
        job: &ConversionJob,
        input: &InputFile,
    ) -> Result<String, EngineError> {
        let input_dir = job.input_dir();
        engine.create_dir(&input_dir).await?;
        let files = [MountFile {
            name: job.file_name.clone(),
            data: input.data.clone(),
        }];
        engine.mount(&files, &input_dir).await?;
        Ok(job.input_path())
    }

    async fn unstage_input(
        &self,
        engine: &dyn Engine,
        job: &ConversionJob,
    ) -> Result<(), EngineError> {
        let input_dir = job.input_dir();
        ignore_missing(engine.unmount(&input_dir).await)?;
        ignore_missing(engine.delete_dir(&input_dir).await)
    }
}
