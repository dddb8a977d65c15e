//! Converter pool integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use local_converter_core::{
    converter::{ConverterPool, SetupError, SetupOptions},
    engine::{Engine, ProgressEvent},
    testing::{fixtures, MemoryAssetSource, MockEngine},
};

/// Builds `size` mock engines and remembers them for assertions.
fn engine_factory() -> (impl FnMut() -> Arc<dyn Engine>, Arc<Mutex<Vec<Arc<MockEngine>>>>) {
    let engines = Arc::new(Mutex::new(Vec::new()));
    let created = engines.clone();
    let factory = move || {
        let engine = Arc::new(MockEngine::new());
        created.lock().unwrap().push(engine.clone());
        engine as Arc<dyn Engine>
    };
    (factory, engines)
}

#[tokio::test]
async fn test_empty_pool_is_rejected() {
    let (factory, engines) = engine_factory();
    let assets = MemoryAssetSource::with_engine_assets();

    let result = ConverterPool::setup(0, factory, &assets, SetupOptions::default()).await;

    assert!(matches!(result, Err(SetupError::EmptyPool)));
    assert!(engines.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_member_releases_the_others() {
    let assets = MemoryAssetSource::with_engine_assets();
    let engines = Arc::new(Mutex::new(Vec::new()));
    let created = engines.clone();
    let factory = move || {
        let engine = Arc::new(MockEngine::new());
        // Third member cannot load
        if created.lock().unwrap().len() == 2 {
            engine.set_load_error(true);
        }
        created.lock().unwrap().push(engine.clone());
        engine as Arc<dyn Engine>
    };

    let result = ConverterPool::setup(3, factory, &assets, SetupOptions::default()).await;

    assert!(matches!(result, Err(SetupError::EngineLoad(_))));
    let engines = engines.lock().unwrap();
    assert_eq!(engines.len(), 3);
    assert!(engines[0].is_terminated());
    assert!(engines[1].is_terminated());
}

#[tokio::test]
async fn test_pool_runs_conversions_in_parallel() {
    let (factory, engines) = engine_factory();
    let assets = MemoryAssetSource::with_engine_assets();
    let pool = ConverterPool::setup(2, factory, &assets, SetupOptions::default())
        .await
        .unwrap();
    assert_eq!(pool.size(), 2);
    assert_eq!(pool.available(), 2);

    for engine in engines.lock().unwrap().iter() {
        engine.set_exec_delay(Duration::from_millis(20));
    }

    let (a, b, c) = tokio::join!(
        pool.execute(fixtures::png_input("a.png"), "image/gif"),
        pool.execute(fixtures::png_input("b.png"), "image/gif"),
        pool.execute(fixtures::png_input("c.png"), "image/gif"),
    );
    assert_eq!(a.unwrap()[0].name, "a.png.gif");
    assert_eq!(b.unwrap()[0].name, "b.png.gif");
    assert_eq!(c.unwrap()[0].name, "c.png.gif");

    // Both members took part and all leases came back
    let engines = engines.lock().unwrap().clone();
    assert!(engines.iter().all(|e| e.exec_count() >= 1));
    assert_eq!(engines.iter().map(|e| e.exec_count()).sum::<usize>(), 3);
    assert_eq!(pool.available(), 2);

    pool.release();
    assert!(engines.iter().all(|e| e.is_terminated()));
}

#[tokio::test]
async fn test_pool_errors_are_passed_through() {
    let (factory, _engines) = engine_factory();
    let assets = MemoryAssetSource::with_engine_assets();
    let pool = ConverterPool::setup(1, factory, &assets, SetupOptions::default())
        .await
        .unwrap();

    let err = pool
        .execute(fixtures::pdf_input("doc.pdf"), "image/png")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "UNSUPPORTEDFORMAT");
    assert_eq!(pool.available(), 1);

    pool.release();
}

#[tokio::test]
async fn test_pool_listener_sees_every_member() {
    let (factory, _engines) = engine_factory();
    let assets = MemoryAssetSource::with_engine_assets();
    let pool = ConverterPool::setup(2, factory, &assets, SetupOptions::default())
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    pool.register_progress_listener(Arc::new(move |event: &ProgressEvent| {
        let _ = tx.send(event.progress);
    }));

    let (a, b) = tokio::join!(
        pool.execute(fixtures::png_input("a.png"), "image/png"),
        pool.execute(fixtures::png_input("b.png"), "image/png"),
    );
    a.unwrap();
    b.unwrap();

    let mut completions = 0;
    while completions < 2 {
        match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
            Ok(Some(progress)) if progress >= 1.0 => completions += 1,
            Ok(Some(_)) => {}
            _ => break,
        }
    }
    assert_eq!(completions, 2);

    pool.release();
}

#[tokio::test]
async fn test_cancelled_pool_call_returns_member_and_cleans_scratch() {
    let (factory, engines) = engine_factory();
    let assets = MemoryAssetSource::with_engine_assets();
    let pool = ConverterPool::setup(1, factory, &assets, SetupOptions::default())
        .await
        .unwrap();
    let engine = engines.lock().unwrap()[0].clone();
    engine.set_exec_delay(Duration::from_millis(200));

    let result = tokio::time::timeout(
        Duration::from_millis(20),
        pool.execute(fixtures::png_input("a.png"), "image/png"),
    )
    .await;
    assert!(result.is_err());
    assert_eq!(pool.available(), 1);

    engine.set_exec_delay(Duration::ZERO);
    let files = pool
        .execute(fixtures::png_input("b.png"), "image/png")
        .await
        .unwrap();
    assert_eq!(files[0].name, "b.png.png");
    assert!(engine.paths().is_empty());

    pool.release();
}
