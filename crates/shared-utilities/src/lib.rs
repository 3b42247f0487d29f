//! # Shared Utilities
//!
//! Stateless helper collaborator injected into every module alongside the
//! event bus and logger. Covers the formatting and validation chores the
//! token-widget surfaces lean on: Ethereum address handling, token amount
//! conversion, text shaping, and a timeout combinator for host waits.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use std::future::Future;
use std::time::Duration;

use primitive_types::U256;
use thiserror::Error;

/// Errors from utility operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UtilityError {
    /// A wait exceeded its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A token amount string could not be parsed.
    #[error("invalid token amount '{0}'")]
    InvalidAmount(String),
}

/// Stateless helper bundle. Cheap to clone; one handle is shared with every
/// loaded module.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedUtilities;

impl SharedUtilities {
    /// Create the helper bundle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Whether `address` is a well-formed `0x`-prefixed Ethereum address.
    #[must_use]
    pub fn is_valid_ethereum_address(&self, address: &str) -> bool {
        let Some(hex) = address.strip_prefix("0x") else {
            return false;
        };
        hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Whether `url` looks like an absolute http(s) URL.
    #[must_use]
    pub fn is_valid_url(&self, url: &str) -> bool {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"));
        rest.is_some_and(|host| !host.is_empty() && !host.starts_with('/'))
    }

    // =========================================================================
    // FORMATTING
    // =========================================================================

    /// Shorten an address for display: `0x1234...abcd`.
    ///
    /// Addresses shorter than `lead + tail` are returned unchanged.
    #[must_use]
    pub fn shorten_address(&self, address: &str, lead: usize, tail: usize) -> String {
        if address.len() <= lead + tail {
            return address.to_string();
        }
        format!(
            "{}...{}",
            &address[..lead],
            &address[address.len() - tail..]
        )
    }

    /// Format a raw token amount with `decimals` into a decimal string,
    /// trimming trailing fraction zeros: `1500000000000000000` @ 18 → `1.5`.
    #[must_use]
    pub fn format_token_amount(&self, raw: U256, decimals: u32) -> String {
        if decimals == 0 {
            return raw.to_string();
        }
        let scale = U256::from(10u64).pow(U256::from(decimals));
        let integer = raw / scale;
        let fraction = raw % scale;
        if fraction.is_zero() {
            return integer.to_string();
        }
        let digits = format!("{fraction:0>width$}", width = decimals as usize);
        let trimmed = digits.trim_end_matches('0');
        format!("{integer}.{trimmed}")
    }

    /// Parse a decimal token amount string into its raw representation:
    /// `"1.5"` @ 18 → `1500000000000000000`.
    pub fn parse_token_amount(&self, text: &str, decimals: u32) -> Result<U256, UtilityError> {
        let invalid = || UtilityError::InvalidAmount(text.to_string());
        let (integer_part, fraction_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };
        if integer_part.is_empty() && fraction_part.is_empty() {
            return Err(invalid());
        }
        if fraction_part.len() > decimals as usize {
            return Err(invalid());
        }

        let scale = U256::from(10u64).pow(U256::from(decimals));
        let integer = if integer_part.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(integer_part).map_err(|_| invalid())?
        };
        let fraction = if fraction_part.is_empty() {
            U256::zero()
        } else {
            let padding = decimals as usize - fraction_part.len();
            let value = U256::from_dec_str(fraction_part).map_err(|_| invalid())?;
            value * U256::from(10u64).pow(U256::from(padding))
        };
        Ok(integer * scale + fraction)
    }

    /// Truncate `text` to `max_length` characters, appending `...` when cut.
    #[must_use]
    pub fn truncate_text(&self, text: &str, max_length: usize) -> String {
        if text.chars().count() <= max_length {
            return text.to_string();
        }
        let cut: String = text.chars().take(max_length).collect();
        format!("{cut}...")
    }

    /// Uppercase the first character.
    #[must_use]
    pub fn capitalize(&self, text: &str) -> String {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }

    /// Lowercased, hyphen-separated slug of `text`.
    #[must_use]
    pub fn slugify(&self, text: &str) -> String {
        let mut slug = String::with_capacity(text.len());
        let mut last_was_hyphen = true;
        for c in text.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
                last_was_hyphen = false;
            } else if !last_was_hyphen {
                slug.push('-');
                last_was_hyphen = true;
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        slug
    }

    // =========================================================================
    // COLLECTIONS / ASYNC
    // =========================================================================

    /// Deduplicate while preserving first-seen order.
    #[must_use]
    pub fn unique<T: Clone + PartialEq>(&self, items: &[T]) -> Vec<T> {
        let mut seen: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            if !seen.contains(item) {
                seen.push(item.clone());
            }
        }
        seen
    }

    /// Await `future` for at most `limit`, failing with `Timeout` otherwise.
    pub async fn with_timeout<F, T>(&self, future: F, limit: Duration) -> Result<T, UtilityError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(limit, future)
            .await
            .map_err(|_| UtilityError::Timeout(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

    #[test]
    fn test_ethereum_address_validation() {
        let utils = SharedUtilities::new();
        assert!(utils.is_valid_ethereum_address(ADDRESS));
        assert!(!utils.is_valid_ethereum_address("1234567890abcdef1234567890abcdef12345678"));
        assert!(!utils.is_valid_ethereum_address("0x1234"));
        assert!(!utils.is_valid_ethereum_address("0x1234567890abcdef1234567890abcdef1234567g"));
    }

    #[test]
    fn test_shorten_address() {
        let utils = SharedUtilities::new();
        assert_eq!(utils.shorten_address(ADDRESS, 6, 4), "0x1234...5678");
        assert_eq!(utils.shorten_address("0xabcd", 6, 4), "0xabcd");
    }

    #[test]
    fn test_format_token_amount() {
        let utils = SharedUtilities::new();
        let one_and_a_half = U256::from_dec_str("1500000000000000000").unwrap();
        assert_eq!(utils.format_token_amount(one_and_a_half, 18), "1.5");
        assert_eq!(utils.format_token_amount(U256::from(5u64), 0), "5");
        assert_eq!(
            utils.format_token_amount(U256::from(1u64), 18),
            "0.000000000000000001"
        );
        assert_eq!(
            utils.format_token_amount(U256::from_dec_str("2000000").unwrap(), 6),
            "2"
        );
    }

    #[test]
    fn test_parse_token_amount_round_trips() {
        let utils = SharedUtilities::new();
        for text in ["1.5", "0.000001", "42", "1000000.125"] {
            let raw = utils.parse_token_amount(text, 18).unwrap();
            assert_eq!(utils.format_token_amount(raw, 18), text);
        }
    }

    #[test]
    fn test_parse_token_amount_rejects_garbage() {
        let utils = SharedUtilities::new();
        assert!(utils.parse_token_amount("", 18).is_err());
        assert!(utils.parse_token_amount(".", 18).is_err());
        assert!(utils.parse_token_amount("1,5", 18).is_err());
        // More fraction digits than the token carries.
        assert!(utils.parse_token_amount("0.0000001", 6).is_err());
    }

    #[test]
    fn test_text_helpers() {
        let utils = SharedUtilities::new();
        assert_eq!(utils.truncate_text("hello world", 5), "hello...");
        assert_eq!(utils.truncate_text("hi", 5), "hi");
        assert_eq!(utils.capitalize("widget"), "Widget");
        assert_eq!(utils.slugify("My Token Widget! v2"), "my-token-widget-v2");
    }

    #[test]
    fn test_unique_preserves_order() {
        let utils = SharedUtilities::new();
        let items = ["b", "a", "b", "c", "a"].map(String::from);
        assert_eq!(utils.unique(&items), ["b", "a", "c"].map(String::from));
    }

    #[tokio::test]
    async fn test_with_timeout() {
        let utils = SharedUtilities::new();
        let ok = utils
            .with_timeout(async { 7u8 }, Duration::from_millis(50))
            .await;
        assert_eq!(ok, Ok(7));

        let slow = utils
            .with_timeout(
                tokio::time::sleep(Duration::from_secs(5)),
                Duration::from_millis(5),
            )
            .await;
        assert!(matches!(slow, Err(UtilityError::Timeout(_))));
    }
}
