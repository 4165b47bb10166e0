//! Client configuration
//!
//! Injected into [`CartSyncClient`](crate::client::CartSyncClient) at construction. Every field
//! has a default, so a partial YAML document only needs to name what it overrides.

use std::time::Duration;

use rusty_money::{Findable, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error("invalid client configuration: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// The configured currency code is not a known ISO currency.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server endpoint paths.
    pub endpoints: Endpoints,

    /// User-facing texts (notifications, labels and prompts).
    pub messages: Messages,

    /// Delays and durations.
    pub timings: Timings,

    /// ISO 4217 code of the storefront currency.
    pub currency: String,

    /// Name of the cookie holding the anti-forgery token.
    pub csrf_cookie: String,

    /// Form field name carrying the coupon code.
    pub coupon_field: String,

    /// Section id markers that never collapse.
    pub required_sections: Vec<String>,

    /// Form fields restricted to digits.
    pub numeric_fields: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            messages: Messages::default(),
            timings: Timings::default(),
            currency: "IRR".to_string(),
            csrf_cookie: "csrftoken".to_string(),
            coupon_field: "coupon_code".to_string(),
            required_sections: vec!["customer-info".to_string(), "order-review".to_string()],
            numeric_fields: vec!["id_phone".to_string(), "id_zip_code".to_string()],
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from YAML, filling unspecified fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the document is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Resolve the configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the code is not an ISO currency.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        Currency::find(&self.currency).ok_or_else(|| ConfigError::UnknownCurrency(self.currency.clone()))
    }
}

/// Server endpoint paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Add an item (JSON body).
    pub add: String,

    /// Remove an item (JSON body).
    pub remove: String,

    /// Clear the whole cart.
    pub clear: String,

    /// Read the current cart quantity.
    pub count: String,

    /// Check whether an item is in the cart. `{id}` and `{type}` are substituted.
    pub check: String,

    /// Apply a coupon (form body).
    pub apply_coupon: String,

    /// Remove the applied coupon.
    pub remove_coupon: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            add: "/cart/ajax/add/".to_string(),
            remove: "/cart/ajax/remove/".to_string(),
            clear: "/cart/clear/".to_string(),
            count: "/cart/ajax/count/".to_string(),
            check: "/cart/ajax/check/{id}/{type}/".to_string(),
            apply_coupon: "/orders/apply-coupon/".to_string(),
            remove_coupon: "/orders/remove-coupon/".to_string(),
        }
    }
}

impl Endpoints {
    /// Expand the check endpoint template for one item.
    pub fn check_path(&self, item_id: &str, item_type: &str) -> String {
        self.check
            .replace("{id}", item_id)
            .replace("{type}", item_type)
    }
}

/// User-facing texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Item added to the cart.
    pub add_success: String,

    /// Item was already in the cart.
    pub already_in_cart: String,

    /// Adding failed without a server message.
    pub add_error: String,

    /// Generic remove confirmation.
    pub remove_confirm: String,

    /// Remove confirmation naming the item. `{name}` is substituted.
    pub remove_confirm_named: String,

    /// Item removed.
    pub remove_success: String,

    /// Removing failed without a server message.
    pub remove_error: String,

    /// Clear confirmation.
    pub clear_confirm: String,

    /// Cart cleared.
    pub clear_success: String,

    /// Clearing failed without a server message.
    pub clear_error: String,

    /// The server could not be reached.
    pub network_error: String,

    /// Coupon apply attempted with an empty code.
    pub coupon_required: String,

    /// Coupon applied without a server message.
    pub coupon_success: String,

    /// Coupon apply failed without a server message.
    pub coupon_error: String,

    /// Coupon removed.
    pub coupon_removed: String,

    /// Checkout attempted without accepting the terms.
    pub terms_required: String,

    /// Add trigger label while the request is pending.
    pub adding_label: String,

    /// Add trigger label once the item is in the cart.
    pub added_label: String,

    /// Add trigger label when the item was already present.
    pub already_in_cart_label: String,

    /// Coupon trigger label while the request is pending.
    pub applying_label: String,

    /// Coupon trigger label once the coupon is applied.
    pub remove_coupon_label: String,

    /// Checkout trigger label while the order is submitted.
    pub processing_label: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            add_success: "Item added to your cart".to_string(),
            already_in_cart: "This item is already in your cart".to_string(),
            add_error: "Could not add the item".to_string(),
            remove_confirm: "Remove this item from your cart?".to_string(),
            remove_confirm_named: "Remove \"{name}\" from your cart?".to_string(),
            remove_success: "Item removed".to_string(),
            remove_error: "Could not remove the item".to_string(),
            clear_confirm: "Empty your cart?".to_string(),
            clear_success: "Your cart is empty".to_string(),
            clear_error: "Could not empty the cart".to_string(),
            network_error: "Could not reach the server".to_string(),
            coupon_required: "Please enter a coupon code".to_string(),
            coupon_success: "Coupon applied".to_string(),
            coupon_error: "Could not apply the coupon".to_string(),
            coupon_removed: "Coupon removed".to_string(),
            terms_required: "Please accept the terms and conditions".to_string(),
            adding_label: "Adding...".to_string(),
            added_label: "In cart".to_string(),
            already_in_cart_label: "Already in cart".to_string(),
            applying_label: "Checking...".to_string(),
            remove_coupon_label: "Remove".to_string(),
            processing_label: "Processing...".to_string(),
        }
    }
}

impl Messages {
    /// Confirmation prompt for removing an item, naming it when a name is known.
    pub fn remove_prompt(&self, display_name: Option<&str>) -> String {
        match display_name {
            Some(name) if !name.is_empty() => self.remove_confirm_named.replace("{name}", name),
            _ => self.remove_confirm.clone(),
        }
    }
}

/// Delays and durations, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Upper bound on a single request.
    pub request_timeout_ms: u64,

    /// Exit transition of a removed row.
    pub row_exit_ms: u64,

    /// Delay before reloading once the last row is gone.
    pub empty_reload_ms: u64,

    /// Delay before reloading after the cart is cleared.
    pub clear_reload_ms: u64,

    /// Display time of non-error notifications.
    pub notification_ms: u64,

    /// Display time of error notifications. Raised past `notification_ms` when not longer.
    pub error_notification_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            row_exit_ms: 300,
            empty_reload_ms: 500,
            clear_reload_ms: 800,
            notification_ms: 4_000,
            error_notification_ms: 5_000,
        }
    }
}

impl Timings {
    /// Request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Row exit transition.
    pub fn row_exit(&self) -> Duration {
        Duration::from_millis(self.row_exit_ms)
    }

    /// Reload delay after the last row is removed.
    pub fn empty_reload(&self) -> Duration {
        Duration::from_millis(self.empty_reload_ms)
    }

    /// Reload delay after a clear.
    pub fn clear_reload(&self) -> Duration {
        Duration::from_millis(self.clear_reload_ms)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() -> TestResult {
        let config = ClientConfig::from_yaml(
            "currency: USD\nendpoints:\n  add: /api/cart/add/\ntimings:\n  request_timeout_ms: 2500\n",
        )?;

        assert_eq!(config.endpoints.add, "/api/cart/add/");
        assert_eq!(config.endpoints.remove, "/cart/ajax/remove/");
        assert_eq!(config.timings.request_timeout(), Duration::from_millis(2500));
        assert_eq!(config.timings.row_exit_ms, 300);
        assert_eq!(config.currency()?, iso::USD);

        Ok(())
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let config = ClientConfig {
            currency: "ZZZ".to_string(),
            ..ClientConfig::default()
        };

        assert!(matches!(
            config.currency(),
            Err(ConfigError::UnknownCurrency(code)) if code == "ZZZ"
        ));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            ClientConfig::from_yaml("timings: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn check_path_substitutes_item() {
        let endpoints = Endpoints::default();

        assert_eq!(
            endpoints.check_path("42", "course"),
            "/cart/ajax/check/42/course/"
        );
    }

    #[test]
    fn remove_prompt_names_item_when_known() {
        let messages = Messages::default();

        assert_eq!(
            messages.remove_prompt(Some("Rust Basics")),
            "Remove \"Rust Basics\" from your cart?"
        );
        assert_eq!(messages.remove_prompt(Some("")), messages.remove_confirm);
        assert_eq!(messages.remove_prompt(None), messages.remove_confirm);
    }
}
