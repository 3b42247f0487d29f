//! # Kernel Invariants Through the App
//!
//! The bus and container carry their own unit tests; these exercise the
//! same invariants end-to-end, through module loading and live system
//! traffic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;

use dependency_injector::{Provider, RegisterOptions};
use ecosystem_runtime::{EcosystemApp, EcosystemConfig};
use module_loader::InMemoryUnitSource;
use shared_types::ModuleSpec;

use super::probe_unit;

#[tokio::test]
async fn test_cyclic_container_registrations_fail_module_load_cleanly() {
    let source = InMemoryUnitSource::new();
    let constructions = Arc::new(AtomicUsize::new(0));
    let cyclic_unit = probe_unit("Cyclic", "cyclic", &constructions);
    source.insert("modules/cyclic", move || Ok(cyclic_unit.clone()));
    let clean_unit = probe_unit("Clean", "clean", &constructions);
    source.insert("modules/clean", move || Ok(clean_unit.clone()));

    let config = EcosystemConfig {
        auto_load: false,
        modules: vec![
            ModuleSpec::new("cyclic", "modules/cyclic", "Cyclic").with_dependencies(["a"]),
            ModuleSpec::new("clean", "modules/clean", "Clean").with_dependencies(["standalone"]),
        ],
        ..EcosystemConfig::default()
    };

    let app = EcosystemApp::new(config, Arc::new(source));
    app.init().await.expect("startup succeeds");

    let injector = app.injector();
    injector
        .register(
            "a",
            Provider::factory(|_| Ok(Arc::new(()) as dependency_injector::Instance)),
            RegisterOptions::default().with_dependencies(["b"]),
        )
        .expect("register a");
    injector
        .register(
            "b",
            Provider::factory(|_| Ok(Arc::new(()) as dependency_injector::Instance)),
            RegisterOptions::default().with_dependencies(["a"]),
        )
        .expect("register b");
    injector
        .value("standalone", Arc::new(1u8))
        .expect("register standalone");

    let err = app.load_module("cyclic").await.expect_err("cycle surfaces");
    assert!(err.to_string().contains("circular dependency"));
    assert_eq!(constructions.load(Ordering::SeqCst), 0);

    // The resolving state unwound: an unrelated module loads fine.
    app.load_module("clean").await.expect("clean module loads");
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listener_failure_is_isolated_from_live_traffic() {
    let app = EcosystemApp::new(
        EcosystemConfig::default(),
        Arc::new(InMemoryUnitSource::new()),
    );
    app.init().await.expect("startup succeeds");

    let bus = app.bus();
    let delivered = Arc::new(AtomicUsize::new(0));
    let before = Arc::clone(&delivered);
    bus.on("wallet:connected", move |_| {
        before.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .expect("subscribe");
    bus.on("wallet:connected", |_| Err("render crashed".into()))
        .expect("subscribe");
    let after = Arc::clone(&delivered);
    bus.on("wallet:connected", move |_| {
        after.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .expect("subscribe");

    let executed = bus.emit("wallet:connected", json!({ "account": "0xabc" }));
    assert_eq!(executed, 2);
    assert_eq!(delivered.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_ambient_defaults_are_resolvable_after_init() {
    let app = EcosystemApp::new(
        EcosystemConfig::default(),
        Arc::new(InMemoryUnitSource::new()),
    );
    app.init().await.expect("startup succeeds");

    let injector = app.injector();
    for name in ["eventBus", "sharedUtilities", "logger", "stateStore", "storage"] {
        assert!(injector.has(name), "ambient default '{name}' missing");
        injector.resolve(name).expect("ambient default resolves");
    }

    // The ambient bus is the app's bus, not a copy.
    let ambient_bus = injector
        .resolve_as::<shared_bus::EventBus>("eventBus")
        .expect("typed resolve");
    assert!(Arc::ptr_eq(&ambient_bus, &app.bus()));
}

#[tokio::test]
async fn test_teardown_clears_every_table() {
    let source = InMemoryUnitSource::new();
    let constructions = Arc::new(AtomicUsize::new(0));
    let unit = probe_unit("A", "a", &constructions);
    source.insert("modules/a", move || Ok(unit.clone()));

    let config = EcosystemConfig {
        modules: vec![ModuleSpec::new("a", "modules/a", "A").auto_load()],
        ..EcosystemConfig::default()
    };

    let app = EcosystemApp::new(config, Arc::new(source));
    app.init().await.expect("startup succeeds");
    assert!(app.get_module("a").is_some());

    app.teardown();
    assert!(app.get_module("a").is_none());
    assert!(app.module_names().is_empty());
    assert!(app.bus().is_destroyed());
    assert_eq!(app.injector().stats().registrations, 0);
}
