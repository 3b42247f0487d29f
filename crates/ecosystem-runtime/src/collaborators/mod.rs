//! # Built-in Host Collaborators
//!
//! Thin wallet/template/analytics/widget systems and the standard feature
//! modules, registered into the kernel through an in-memory unit source.
//! These exercise the kernel end-to-end from the runtime binary and the
//! integration suite; the kernel itself never depends on them.

pub mod modules;
pub mod systems;

use std::sync::Arc;

use module_loader::InMemoryUnitSource;

use crate::module::{Module, UnitHandle};
use modules::{AnalyticsReports, SystemSettings, TemplateGallery, TokenManager, UserProfile};
use systems::{AnalyticsSystem, TemplateSystem, WalletSystem, WidgetSystem};

/// Unit source for the platform's standard catalog.
///
/// Paths match [`crate::config::EcosystemConfig::platform_catalog`].
#[must_use]
pub fn builtin_source() -> InMemoryUnitSource<UnitHandle> {
    let source = InMemoryUnitSource::new();

    source.insert("systems/wallet-system", || {
        Ok(UnitHandle::new("WalletSystem", |ctx| {
            Ok(Arc::new(WalletSystem::new(ctx)) as Arc<dyn Module>)
        }))
    });
    source.insert("systems/template-system", || {
        Ok(UnitHandle::new("TemplateSystem", |ctx| {
            Ok(Arc::new(TemplateSystem::new(ctx)) as Arc<dyn Module>)
        }))
    });
    source.insert("systems/analytics-system", || {
        Ok(UnitHandle::new("AnalyticsSystem", |ctx| {
            Ok(Arc::new(AnalyticsSystem::new(ctx)) as Arc<dyn Module>)
        }))
    });
    source.insert("systems/widget-system", || {
        Ok(UnitHandle::new("WidgetSystem", |ctx| {
            Ok(Arc::new(WidgetSystem::new(ctx)) as Arc<dyn Module>)
        }))
    });

    source.insert("modules/token-manager", || {
        Ok(UnitHandle::new("TokenManager", |ctx| {
            Ok(Arc::new(TokenManager::new(ctx)) as Arc<dyn Module>)
        }))
    });
    source.insert("modules/user-profile", || {
        Ok(UnitHandle::new("UserProfile", |ctx| {
            Ok(Arc::new(UserProfile::new(ctx)?) as Arc<dyn Module>)
        }))
    });
    source.insert("modules/system-settings", || {
        Ok(UnitHandle::new("SystemSettings", |ctx| {
            Ok(Arc::new(SystemSettings::new(ctx)?) as Arc<dyn Module>)
        }))
    });
    source.insert("modules/template-gallery", || {
        Ok(UnitHandle::new("TemplateGallery", |ctx| {
            Ok(Arc::new(TemplateGallery::new(ctx)) as Arc<dyn Module>)
        }))
    });
    source.insert("modules/analytics-reports", || {
        Ok(UnitHandle::new("AnalyticsReports", |ctx| {
            Ok(Arc::new(AnalyticsReports::new(ctx)) as Arc<dyn Module>)
        }))
    });

    source
}
