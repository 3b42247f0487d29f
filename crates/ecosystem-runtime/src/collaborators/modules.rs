//! # Feature Modules
//!
//! Lazily-loadable features of the platform. Modules consume their declared
//! container dependencies plus the ambient context; those touching systems
//! do so through the read-only systems view.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;
use primitive_types::U256;
use serde_json::{json, Value};
use thiserror::Error;

use crate::module::{Module, ModuleContext, ModuleInitError};
use crate::storage::InMemoryStorage;

use super::systems::{AnalyticsSystem, TemplateSystem};

/// Errors from token bookkeeping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The contract address failed validation.
    #[error("invalid token address '{0}'")]
    InvalidAddress(String),

    /// The symbol is already tracked.
    #[error("token '{0}' already tracked")]
    Duplicate(String),
}

/// One tracked token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedToken {
    pub symbol: String,
    pub address: String,
    pub decimals: u32,
    pub balance: U256,
}

/// Bookkeeping for the user's tracked tokens. The platform's only
/// auto-load module.
pub struct TokenManager {
    ctx: ModuleContext,
    tokens: RwLock<Vec<TrackedToken>>,
}

impl TokenManager {
    pub fn new(ctx: ModuleContext) -> Self {
        ctx.logger.debug("token manager initialized");
        Self {
            ctx,
            tokens: RwLock::new(Vec::new()),
        }
    }

    /// Track a token after validating its contract address.
    pub fn track(&self, symbol: &str, address: &str, decimals: u32) -> Result<(), TokenError> {
        if !self.ctx.utilities.is_valid_ethereum_address(address) {
            return Err(TokenError::InvalidAddress(address.to_string()));
        }
        let mut tokens = self.tokens.write();
        if tokens.iter().any(|t| t.symbol == symbol) {
            return Err(TokenError::Duplicate(symbol.to_string()));
        }
        tokens.push(TrackedToken {
            symbol: symbol.to_string(),
            address: address.to_string(),
            decimals,
            balance: U256::zero(),
        });
        drop(tokens);

        self.ctx
            .bus
            .emit("tokens:tracked", json!({ "symbol": symbol }));
        Ok(())
    }

    /// Update a token's raw balance; returns the display amount.
    pub fn set_balance(&self, symbol: &str, raw: U256) -> Option<String> {
        let mut tokens = self.tokens.write();
        let token = tokens.iter_mut().find(|t| t.symbol == symbol)?;
        token.balance = raw;
        Some(self.ctx.utilities.format_token_amount(raw, token.decimals))
    }

    /// Tracked symbols in insertion order.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.tokens.read().iter().map(|t| t.symbol.clone()).collect()
    }
}

impl Module for TokenManager {
    fn name(&self) -> &str {
        "tokens"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// User profile data over the ambient storage service.
pub struct UserProfile {
    ctx: ModuleContext,
    storage: Arc<InMemoryStorage>,
}

impl UserProfile {
    pub fn new(ctx: ModuleContext) -> Result<Self, ModuleInitError> {
        let storage = ctx
            .deps
            .get::<InMemoryStorage>("storage")
            .ok_or("storage dependency missing")?;
        Ok(Self { ctx, storage })
    }

    /// Store the display name and mirror it into observable state events.
    pub fn set_display_name(&self, name: &str) {
        self.storage.set("profile:display_name", json!(name));
        self.ctx
            .bus
            .emit("profile:updated", json!({ "display_name": name }));
    }

    /// The stored display name, if any.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        self.storage
            .get("profile:display_name")
            .and_then(|v| v.as_str().map(String::from))
    }
}

impl Module for UserProfile {
    fn name(&self) -> &str {
        "profile"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Persisted ecosystem settings over the ambient storage service.
pub struct SystemSettings {
    storage: Arc<InMemoryStorage>,
}

impl SystemSettings {
    pub fn new(ctx: ModuleContext) -> Result<Self, ModuleInitError> {
        let storage = ctx
            .deps
            .get::<InMemoryStorage>("storage")
            .ok_or("storage dependency missing")?;
        Ok(Self { storage })
    }

    /// Write a setting under the `settings:` prefix.
    pub fn set(&self, key: &str, value: Value) {
        self.storage.set(&format!("settings:{key}"), value);
    }

    /// Read a setting, falling back to `default`.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.storage
            .get(&format!("settings:{key}"))
            .unwrap_or(default)
    }
}

impl Module for SystemSettings {
    fn name(&self) -> &str {
        "settings"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Named widget templates rendered through the template system.
pub struct TemplateGallery {
    ctx: ModuleContext,
    templates: RwLock<Vec<(String, String)>>,
}

impl TemplateGallery {
    pub fn new(ctx: ModuleContext) -> Self {
        Self {
            ctx,
            templates: RwLock::new(Vec::new()),
        }
    }

    /// Save a template under `name`, replacing any previous body.
    pub fn save(&self, name: &str, body: &str) {
        let mut templates = self.templates.write();
        if let Some(entry) = templates.iter_mut().find(|(n, _)| n == name) {
            entry.1 = body.to_string();
        } else {
            templates.push((name.to_string(), body.to_string()));
        }
    }

    /// Render a saved template through the template system; `None` when the
    /// template or the system is missing.
    #[must_use]
    pub fn render(
        &self,
        name: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> Option<String> {
        let body = {
            let templates = self.templates.read();
            templates.iter().find(|(n, _)| n == name)?.1.clone()
        };
        let system = self.ctx.systems.get("template")?;
        let template = system.as_any().downcast_ref::<TemplateSystem>()?;
        Some(template.render(&body, vars))
    }

    /// Saved template names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.templates.read().iter().map(|(n, _)| n.clone()).collect()
    }
}

impl Module for TemplateGallery {
    fn name(&self) -> &str {
        "templates"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Summaries over the analytics system's counters.
pub struct AnalyticsReports {
    ctx: ModuleContext,
}

impl AnalyticsReports {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }

    /// Totals per tracked event, or an empty report when the analytics
    /// system is not loaded.
    #[must_use]
    pub fn summary(&self) -> Value {
        let totals = self
            .ctx
            .systems
            .get("analytics")
            .and_then(|system| {
                system
                    .as_any()
                    .downcast_ref::<AnalyticsSystem>()
                    .map(AnalyticsSystem::totals)
            })
            .unwrap_or_default();

        let events: Vec<Value> = totals
            .into_iter()
            .map(|(event, count)| json!({ "event": event, "count": count }))
            .collect();
        json!({ "events": events })
    }
}

impl Module for AnalyticsReports {
    fn name(&self) -> &str {
        "analytics"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}
