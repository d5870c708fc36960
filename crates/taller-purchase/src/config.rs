//! # Session Configuration
//!
//! Settings for a purchase editing session, loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TALLER_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after initialization, so no lock needed.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use taller_core::Money;
use tracing::warn;

/// Quick-add requests give up after this long unless configured otherwise.
pub const DEFAULT_QUICK_ADD_TIMEOUT: Duration = Duration::from_secs(15);

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Upper bound on a quick-add catalog round-trip.
    /// `None` waits for the catalog indefinitely.
    pub quick_add_timeout: Option<Duration>,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,
}

impl Default for SessionConfig {
    /// ## Default Values
    /// - Quick-add timeout: 15 s
    /// - Currency: EUR (€)
    fn default() -> Self {
        SessionConfig {
            quick_add_timeout: Some(DEFAULT_QUICK_ADD_TIMEOUT),
            currency_code: "EUR".to_string(),
            currency_symbol: "€".to_string(),
        }
    }
}

impl SessionConfig {
    /// Creates a SessionConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `TALLER_QUICK_ADD_TIMEOUT_SECS`: seconds, `0` disables the timeout
    /// - `TALLER_CURRENCY_CODE`: e.g. "EUR"
    /// - `TALLER_CURRENCY_SYMBOL`: e.g. "€"
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = SessionConfig::default();

        if let Some(raw) = lookup("TALLER_QUICK_ADD_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.quick_add_timeout = None,
                Ok(secs) => config.quick_add_timeout = Some(Duration::from_secs(secs)),
                Err(e) => warn!(value = %raw, error = %e, "Ignoring TALLER_QUICK_ADD_TIMEOUT_SECS"),
            }
        }

        if let Some(code) = lookup("TALLER_CURRENCY_CODE") {
            config.currency_code = code;
        }

        if let Some(symbol) = lookup("TALLER_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        config
    }

    /// Formats an amount for display, e.g. `€12.34` or `-€0.50`.
    pub fn format_currency(&self, amount: Money) -> String {
        if amount.is_negative() {
            format!("-{}{}", self.currency_symbol, Money::from_cents(-amount.cents()))
        } else {
            format!("{}{}", self.currency_symbol, amount)
        }
    }
}
