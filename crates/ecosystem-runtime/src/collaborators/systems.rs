//! # Core Feature Systems
//!
//! Wallet connection state, template rendering, analytics counters and
//! widget configuration. Each is constructed with the ambient context and
//! talks to the rest of the ecosystem only through the bus.

use std::any::Any;
use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::{json, Value};
use thiserror::Error;

use crate::module::{Module, ModuleContext};

/// Errors from the wallet system.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The address is not a well-formed Ethereum address.
    #[error("invalid wallet address '{0}'")]
    InvalidAddress(String),
}

/// Tracks the connected account and announces connection changes.
pub struct WalletSystem {
    ctx: ModuleContext,
    account: RwLock<Option<String>>,
}

impl WalletSystem {
    pub fn new(ctx: ModuleContext) -> Self {
        ctx.logger.debug("wallet system initialized");
        Self {
            ctx,
            account: RwLock::new(None),
        }
    }

    /// Connect an account after validating the address. Emits
    /// `wallet:connected` with the shortened display form.
    pub fn connect(&self, address: &str) -> Result<(), WalletError> {
        if !self.ctx.utilities.is_valid_ethereum_address(address) {
            return Err(WalletError::InvalidAddress(address.to_string()));
        }
        *self.account.write() = Some(address.to_string());

        let display = self.ctx.utilities.shorten_address(address, 6, 4);
        self.ctx
            .bus
            .emit("wallet:connected", json!({ "account": address, "display": display }));
        Ok(())
    }

    /// Drop the connected account. Emits `wallet:disconnected`.
    pub fn disconnect(&self) {
        if self.account.write().take().is_some() {
            self.ctx.bus.emit("wallet:disconnected", Value::Null);
        }
    }

    /// The connected account, if any.
    #[must_use]
    pub fn current_account(&self) -> Option<String> {
        self.account.read().clone()
    }

    /// Whether an account is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.account.read().is_some()
    }
}

impl Module for WalletSystem {
    fn name(&self) -> &str {
        "wallet"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Renders `{{key}}` placeholders from a variable map.
pub struct TemplateSystem {
    ctx: ModuleContext,
}

impl TemplateSystem {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }

    /// Substitute every `{{key}}` in `template`; unknown keys are left
    /// untouched so missing variables stay visible.
    #[must_use]
    pub fn render(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut rendered = template.to_string();
        for (key, value) in vars {
            rendered = rendered.replace(&format!("{{{{{key}}}}}"), value);
        }
        self.ctx.logger.debug("template rendered");
        rendered
    }
}

impl Module for TemplateSystem {
    fn name(&self) -> &str {
        "template"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Counts named events for report generation.
pub struct AnalyticsSystem {
    ctx: ModuleContext,
    counters: RwLock<HashMap<String, u64>>,
}

impl AnalyticsSystem {
    pub fn new(ctx: ModuleContext) -> Self {
        Self {
            ctx,
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Count one occurrence of `event`.
    pub fn track(&self, event: &str) {
        *self.counters.write().entry(event.to_string()).or_insert(0) += 1;
        self.ctx.logger.debug("event tracked");
    }

    /// Occurrences of `event` so far.
    #[must_use]
    pub fn count(&self, event: &str) -> u64 {
        self.counters.read().get(event).copied().unwrap_or(0)
    }

    /// All counters, sorted by event name.
    #[must_use]
    pub fn totals(&self) -> Vec<(String, u64)> {
        let mut totals: Vec<(String, u64)> = self
            .counters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        totals.sort_unstable();
        totals
    }
}

impl Module for AnalyticsSystem {
    fn name(&self) -> &str {
        "analytics"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Errors from the widget system.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// The token address failed validation.
    #[error("invalid token address '{0}'")]
    InvalidTokenAddress(String),
}

/// Builds embeddable widget configurations for a token.
pub struct WidgetSystem {
    ctx: ModuleContext,
}

impl WidgetSystem {
    pub fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }

    /// Produce the embed configuration for a token sale widget.
    pub fn build_config(
        &self,
        widget_name: &str,
        token_address: &str,
        decimals: u32,
    ) -> Result<Value, WidgetError> {
        if !self.ctx.utilities.is_valid_ethereum_address(token_address) {
            return Err(WidgetError::InvalidTokenAddress(token_address.to_string()));
        }
        let slug = self.ctx.utilities.slugify(widget_name);
        Ok(json!({
            "widget": slug,
            "token": {
                "address": token_address,
                "display": self.ctx.utilities.shorten_address(token_address, 6, 4),
                "decimals": decimals,
            },
        }))
    }
}

impl Module for WidgetSystem {
    fn name(&self) -> &str {
        "widget"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}
