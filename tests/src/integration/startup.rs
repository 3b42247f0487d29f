//! # End-to-End Startup Tests
//!
//! Drives `init()` through synthetic catalogs and the built-in platform
//! catalog, asserting the sequencing and failure-domain guarantees:
//!
//! 1. **Happy Path**: auto-load modules load, lazy modules stay registered
//! 2. **Fatal Path**: a required system failure aborts startup
//! 3. **Degraded Path**: an optional system failure only degrades
//! 4. **Readiness**: single-shot gate, no missed-event race

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use ecosystem_runtime::collaborators::builtin_source;
use ecosystem_runtime::collaborators::modules::TokenManager;
use ecosystem_runtime::collaborators::systems::WalletSystem;
use ecosystem_runtime::{EcosystemApp, EcosystemConfig, EcosystemError};
use module_loader::InMemoryUnitSource;
use shared_types::events::topics;
use shared_types::{ModuleSpec, SystemSpec};

use super::{collect_events, probe_unit};

const ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

fn two_module_config() -> EcosystemConfig {
    EcosystemConfig {
        modules: vec![
            ModuleSpec::new("a", "modules/a", "A").auto_load(),
            ModuleSpec::new("b", "modules/b", "B"),
        ],
        ..EcosystemConfig::default()
    }
}

#[tokio::test]
async fn test_auto_load_loads_flagged_modules_only() {
    let source = InMemoryUnitSource::new();
    let constructions = Arc::new(AtomicUsize::new(0));
    for (path, class_ref, name) in [("modules/a", "A", "a"), ("modules/b", "B", "b")] {
        let unit = probe_unit(class_ref, name, &constructions);
        source.insert(path, move || Ok(unit.clone()));
    }

    let app = EcosystemApp::new(two_module_config(), Arc::new(source));
    let loads = collect_events(&app.bus(), topics::MODULE_LOAD);

    app.init().await.expect("startup succeeds");

    assert!(app.is_ready());
    assert!(app.get_module("a").is_some());
    assert!(app.get_module("b").is_none());
    assert_eq!(constructions.load(Ordering::SeqCst), 1);

    // Explicitly loading B flips it exactly once.
    let loaded = app.load_module("b").await.expect("b loads");
    assert!(Arc::ptr_eq(&loaded, &app.get_module("b").expect("cached")));

    let b_loads = loads
        .lock()
        .iter()
        .filter(|payload| payload["name"] == "b")
        .count();
    assert_eq!(b_loads, 1);
    assert_eq!(constructions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_required_system_failure_is_fatal() {
    let source = InMemoryUnitSource::new();
    source.insert_failing("systems/wallet", "provider unreachable");

    let config = EcosystemConfig {
        systems: vec![SystemSpec::new("wallet", "systems/wallet", "WalletSystem", 1).required()],
        modules: vec![ModuleSpec::new("a", "modules/a", "A").auto_load()],
        ..EcosystemConfig::default()
    };

    let app = EcosystemApp::new(config, Arc::new(source));
    let ready = collect_events(&app.bus(), topics::ECOSYSTEM_READY);
    let errors = collect_events(&app.bus(), topics::ECOSYSTEM_ERROR);

    let err = app.init().await.expect_err("startup aborts");
    assert!(matches!(err, EcosystemError::RequiredSystem { ref name, .. } if name == "wallet"));
    assert!(err.to_string().contains("provider unreachable"));

    assert!(!app.is_ready());
    assert!(ready.lock().is_empty());
    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["message"]
        .as_str()
        .expect("message")
        .contains("provider unreachable"));

    // Auto-load never ran past the fatal phase.
    assert!(app.get_module("a").is_none());
}

#[tokio::test]
async fn test_init_retry_after_fatal_failure() {
    let source: Arc<InMemoryUnitSource<ecosystem_runtime::UnitHandle>> =
        Arc::new(InMemoryUnitSource::new());
    source.insert_failing("systems/wallet", "provider unreachable");

    let config = EcosystemConfig {
        systems: vec![SystemSpec::new("wallet", "systems/wallet", "WalletSystem", 1).required()],
        ..EcosystemConfig::default()
    };

    let app = EcosystemApp::new(
        config,
        Arc::clone(&source) as Arc<dyn module_loader::UnitSource<ecosystem_runtime::UnitHandle>>,
    );
    let ready = collect_events(&app.bus(), topics::ECOSYSTEM_READY);

    app.init().await.expect_err("first attempt aborts");
    assert!(!app.is_ready());

    // The provider comes back; a retried init completes the startup.
    let constructions = Arc::new(AtomicUsize::new(0));
    let unit = probe_unit("WalletSystem", "wallet", &constructions);
    source.insert("systems/wallet", move || Ok(unit.clone()));

    app.init().await.expect("retry succeeds");
    assert!(app.is_ready());
    assert!(app.get_system("wallet").is_some());
    assert_eq!(ready.lock().len(), 1);
}

#[tokio::test]
async fn test_optional_system_failure_degrades() {
    let source = InMemoryUnitSource::new();
    let constructions = Arc::new(AtomicUsize::new(0));
    let unit = probe_unit("Healthy", "healthy", &constructions);
    source.insert("systems/healthy", move || Ok(unit.clone()));
    source.insert_failing("systems/flaky", "cdn outage");

    let config = EcosystemConfig {
        systems: vec![
            SystemSpec::new("flaky", "systems/flaky", "Flaky", 1),
            SystemSpec::new("healthy", "systems/healthy", "Healthy", 2),
        ],
        ..EcosystemConfig::default()
    };

    let app = EcosystemApp::new(config, Arc::new(source));
    let system_errors = collect_events(&app.bus(), topics::SYSTEM_ERROR);

    app.init().await.expect("startup degrades, not halts");

    assert!(app.is_ready());
    assert!(app.get_system("flaky").is_none());
    assert!(app.get_system("healthy").is_some());

    let system_errors = system_errors.lock();
    assert_eq!(system_errors.len(), 1);
    assert_eq!(system_errors[0]["name"], "flaky");
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let source = InMemoryUnitSource::new();
    let constructions = Arc::new(AtomicUsize::new(0));
    let unit = probe_unit("A", "a", &constructions);
    source.insert("modules/a", move || Ok(unit.clone()));

    let config = EcosystemConfig {
        modules: vec![ModuleSpec::new("a", "modules/a", "A").auto_load()],
        ..EcosystemConfig::default()
    };

    let app = EcosystemApp::new(config, Arc::new(source));
    let ready = collect_events(&app.bus(), topics::ECOSYSTEM_READY);

    app.init().await.expect("first init");
    app.init().await.expect("second init is a no-op");

    assert_eq!(ready.lock().len(), 1);
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert_eq!(app.loader().stats().fetches, 1);
}

#[tokio::test]
async fn test_ready_gate_has_no_missed_event_race() {
    let app = EcosystemApp::new(
        EcosystemConfig::default(),
        Arc::new(InMemoryUnitSource::new()),
    );

    // Before init: the gate waits.
    let early = Arc::new(AtomicUsize::new(0));
    let early_count = Arc::clone(&early);
    app.on_ready(move || {
        early_count.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(early.load(Ordering::SeqCst), 0);

    app.init().await.expect("startup succeeds");
    app.wait_ready(Duration::from_secs(1)).await.expect("ready");
    assert_eq!(early.load(Ordering::SeqCst), 1);

    // After the fact: fires immediately, exactly once.
    let late = Arc::new(AtomicUsize::new(0));
    let late_count = Arc::clone(&late);
    app.on_ready(move || {
        late_count.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(late.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_wait_ready_times_out_without_init() {
    let app = EcosystemApp::new(
        EcosystemConfig::default(),
        Arc::new(InMemoryUnitSource::new()),
    );

    let err = app
        .wait_ready(Duration::from_millis(20))
        .await
        .expect_err("never became ready");
    assert!(matches!(err, EcosystemError::ReadyTimeout(_)));
}

#[tokio::test]
async fn test_state_writes_publish_state_changed() {
    let app = EcosystemApp::new(
        EcosystemConfig::default(),
        Arc::new(InMemoryUnitSource::new()),
    );
    let changes = collect_events(&app.bus(), topics::STATE_CHANGED);

    app.set_state("wallet.network", json!("mainnet"));
    assert_eq!(app.get_state("wallet.network"), Some(json!("mainnet")));

    let changes = changes.lock();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["property"], "wallet.network");
    assert_eq!(changes[0]["value"], "mainnet");
}

#[tokio::test]
async fn test_platform_catalog_end_to_end() {
    let app = EcosystemApp::new(
        EcosystemConfig::platform_catalog(),
        Arc::new(builtin_source()),
    );
    app.init().await.expect("platform startup succeeds");

    // All four systems loaded, only the token manager auto-loaded.
    for system in ["wallet", "template", "analytics", "widget"] {
        assert!(app.get_system(system).is_some(), "system '{system}' missing");
    }
    assert!(app.get_module("tokens").is_some());
    assert!(app.get_module("profile").is_none());

    // The wallet system accepts a connection and announces it.
    let connections = collect_events(&app.bus(), "wallet:connected");
    let wallet = app.get_system("wallet").expect("wallet loaded");
    let wallet = wallet
        .as_any()
        .downcast_ref::<WalletSystem>()
        .expect("concrete wallet");
    wallet.connect(ADDRESS).expect("valid address");
    assert_eq!(connections.lock().len(), 1);

    // The token manager tracks a token through shared utilities.
    let tokens = app.get_module("tokens").expect("auto-loaded");
    let tokens = tokens
        .as_any()
        .downcast_ref::<TokenManager>()
        .expect("concrete manager");
    tokens.track("HIVE", ADDRESS, 18).expect("tracks");
    assert_eq!(tokens.symbols(), vec!["HIVE".to_string()]);

    // Lazy modules load on demand with their container dependencies.
    app.load_module("profile").await.expect("profile loads");
    assert!(app.get_module("profile").is_some());
}
