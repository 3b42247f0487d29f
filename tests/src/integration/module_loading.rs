//! # On-Demand Module Loading Tests
//!
//! Coalescing of concurrent loads, retry after failure, descriptor
//! cross-checks and lookup semantics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use ecosystem_runtime::{EcosystemApp, EcosystemConfig, EcosystemError, UnitHandle};
use module_loader::{FetchError, InMemoryUnitSource, UnitSource};
use shared_types::events::topics;
use shared_types::ModuleSpec;

use super::{collect_events, probe_unit};

/// Source whose fetches suspend long enough for callers to overlap.
struct SlowSource {
    unit: UnitHandle,
    fetches: Arc<AtomicUsize>,
}

#[async_trait]
impl UnitSource<UnitHandle> for SlowSource {
    async fn fetch(&self, _identifier: &str) -> Result<UnitHandle, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(25)).await;
        Ok(self.unit.clone())
    }
}

fn single_module_config() -> EcosystemConfig {
    EcosystemConfig {
        auto_load: false,
        modules: vec![ModuleSpec::new("a", "modules/a", "A")],
        ..EcosystemConfig::default()
    }
}

#[tokio::test]
async fn test_concurrent_load_module_calls_coalesce() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let constructions = Arc::new(AtomicUsize::new(0));
    let source = SlowSource {
        unit: probe_unit("A", "a", &constructions),
        fetches: Arc::clone(&fetches),
    };

    let app = EcosystemApp::new(single_module_config(), Arc::new(source));
    let loads = collect_events(&app.bus(), topics::MODULE_LOAD);
    app.init().await.expect("startup succeeds");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = Arc::clone(&app);
        handles.push(tokio::spawn(async move { app.load_module("a").await }));
    }
    let mut instances = Vec::new();
    for handle in handles {
        instances.push(handle.await.expect("join").expect("load succeeds"));
    }

    // One fetch, one instantiation, one load event; every caller got the
    // same instance.
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert_eq!(loads.lock().len(), 1);
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
}

#[tokio::test]
async fn test_failed_load_emits_error_and_is_retryable() {
    let source = InMemoryUnitSource::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let constructions = Arc::new(AtomicUsize::new(0));
    let unit = probe_unit("A", "a", &constructions);
    let counter = Arc::clone(&attempts);
    source.insert("modules/a", move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err("script fetch failed".into())
        } else {
            Ok(unit.clone())
        }
    });

    let app = EcosystemApp::new(single_module_config(), Arc::new(source));
    let errors = collect_events(&app.bus(), topics::MODULE_ERROR);
    let loads = collect_events(&app.bus(), topics::MODULE_LOAD);
    app.init().await.expect("startup succeeds");

    let err = app.load_module("a").await.expect_err("first load fails");
    assert!(matches!(err, EcosystemError::ModuleLoad { ref name, .. } if name == "a"));
    assert!(app.get_module("a").is_none());
    {
        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0]["error"]
            .as_str()
            .expect("error string")
            .contains("script fetch failed"));
    }

    // The descriptor stayed registered; a retry loads cleanly.
    app.load_module("a").await.expect("retry succeeds");
    assert!(app.get_module("a").is_some());
    assert_eq!(loads.lock().len(), 1);
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_load_module_unknown_name() {
    let app = EcosystemApp::new(
        EcosystemConfig::default(),
        Arc::new(InMemoryUnitSource::new()),
    );
    app.init().await.expect("startup succeeds");

    let err = app.load_module("ghost").await.expect_err("unknown module");
    assert!(matches!(err, EcosystemError::ModuleNotFound(ref name) if name == "ghost"));
}

#[tokio::test]
async fn test_class_ref_mismatch_fails_load() {
    let source = InMemoryUnitSource::new();
    let constructions = Arc::new(AtomicUsize::new(0));
    let unit = probe_unit("SomethingElse", "a", &constructions);
    source.insert("modules/a", move || Ok(unit.clone()));

    let app = EcosystemApp::new(single_module_config(), Arc::new(source));
    app.init().await.expect("startup succeeds");

    let err = app.load_module("a").await.expect_err("wrong constructor");
    let message = err.to_string();
    assert!(message.contains("SomethingElse"));
    assert!(message.contains('A'));
    assert_eq!(constructions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_loaded_instance_is_cached() {
    let source = InMemoryUnitSource::new();
    let constructions = Arc::new(AtomicUsize::new(0));
    let unit = probe_unit("A", "a", &constructions);
    source.insert("modules/a", move || Ok(unit.clone()));

    let app = EcosystemApp::new(single_module_config(), Arc::new(source));
    app.init().await.expect("startup succeeds");

    let first = app.load_module("a").await.expect("loads");
    let second = app.load_module("a").await.expect("cached");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert_eq!(app.loader().stats().fetches, 1);
}

#[tokio::test]
async fn test_duplicate_registration_keeps_first_descriptor() {
    let source = InMemoryUnitSource::new();
    let constructions = Arc::new(AtomicUsize::new(0));
    let unit = probe_unit("A", "a", &constructions);
    source.insert("modules/a", move || Ok(unit.clone()));

    let app = EcosystemApp::new(single_module_config(), Arc::new(source));
    let registrations = collect_events(&app.bus(), topics::MODULE_REGISTER);
    app.init().await.expect("startup succeeds");

    assert!(!app.register_module(ModuleSpec::new("a", "modules/other", "Other")));
    assert_eq!(registrations.lock().len(), 1);

    // The original descriptor still drives loading.
    app.load_module("a").await.expect("loads from original path");
}
