//! Wire schema
//!
//! One canonical response shape for every cart and coupon endpoint. Legacy field names are
//! accepted as aliases so the rest of the crate only ever sees the canonical names.

use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    items::{CartItemRef, ItemType},
    snapshot::{CartSnapshot, CartTotals, SnapshotError},
    transport::RequestBody,
};

fn default_success() -> bool {
    true
}

/// Canonical server response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartResponse {
    /// Business-level success flag. Absent on read-only responses, which count as success.
    #[serde(default = "default_success")]
    pub success: bool,

    /// Whether an add actually inserted the item (`false` when it was already present).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<bool>,

    /// Number of items in the cart.
    #[serde(
        default,
        alias = "cart_total_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub cart_quantity: Option<u32>,

    /// Cart amount before any coupon.
    #[serde(
        default,
        alias = "cart_total_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub cart_total: Option<Decimal>,

    /// Coupon discount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Decimal>,

    /// Amount payable after the coupon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,

    /// Membership flag returned by the check endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_cart: Option<bool>,

    /// Human-readable server message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Default for CartResponse {
    fn default() -> Self {
        Self {
            success: true,
            added: None,
            cart_quantity: None,
            cart_total: None,
            discount_amount: None,
            total: None,
            in_cart: None,
            message: None,
        }
    }
}

impl CartResponse {
    /// Server message, ignoring blank strings.
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }

    /// Adapt the response into a snapshot in `currency`.
    ///
    /// With a discount, the subtotal is `cart_total` when present and `total + discount`
    /// otherwise. Without one, `cart_total` is both subtotal and total.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::AmountOutOfRange`] if an amount overflows minor units.
    pub fn snapshot(&self, currency: &'static Currency) -> Result<CartSnapshot, SnapshotError> {
        let totals = match (self.discount_amount, self.cart_total, self.total) {
            (Some(discount), Some(subtotal), _) => {
                Some(CartTotals::from_decimal(subtotal, discount, currency)?)
            }
            (Some(discount), None, Some(total)) => {
                let subtotal = total
                    .checked_add(discount)
                    .ok_or(SnapshotError::AmountOutOfRange(total))?;

                Some(CartTotals::from_decimal(subtotal, discount, currency)?)
            }
            (None, Some(subtotal), _) => {
                Some(CartTotals::from_decimal(subtotal, Decimal::ZERO, currency)?)
            }
            _ => None,
        };

        Ok(CartSnapshot {
            quantity: self.cart_quantity,
            totals,
        })
    }
}

/// JSON body of the add and remove endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRequest {
    /// Item id.
    pub product_id: String,

    /// Item type.
    pub product_type: ItemType,
}

impl From<&CartItemRef> for ItemRequest {
    fn from(item: &CartItemRef) -> Self {
        Self {
            product_id: item.item_id().to_string(),
            product_type: item.item_type(),
        }
    }
}

impl From<ItemRequest> for RequestBody {
    fn from(request: ItemRequest) -> Self {
        RequestBody::Json(json!({
            "product_id": request.product_id,
            "product_type": request.product_type,
        }))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn count_response_without_success_flag_is_success() -> TestResult {
        let response: CartResponse = serde_json::from_str(r#"{"cart_quantity": 4}"#)?;

        assert!(response.success);
        assert_eq!(response.cart_quantity, Some(4));

        Ok(())
    }

    #[test]
    fn legacy_field_names_are_aliases() -> TestResult {
        let response: CartResponse = serde_json::from_str(
            r#"{"success": true, "discount_amount": 100, "total": 900, "cart_total_quantity": 2, "cart_total_price": 1000}"#,
        )?;

        assert_eq!(response.cart_quantity, Some(2));
        assert_eq!(response.cart_total, Some(Decimal::new(1000, 0)));

        Ok(())
    }

    #[test]
    fn coupon_snapshot_derives_subtotal_from_total() -> TestResult {
        let response: CartResponse =
            serde_json::from_str(r#"{"success": true, "discount_amount": 100.0, "total": 900.0}"#)?;

        let totals = response.snapshot(iso::USD)?.totals.ok_or("missing totals")?;

        assert_eq!(totals.subtotal().to_minor_units(), 100_000);
        assert_eq!(totals.discount().to_minor_units(), 10_000);
        assert_eq!(totals.total().to_minor_units(), 90_000);

        Ok(())
    }

    #[test]
    fn cart_total_is_authoritative_subtotal_when_present() -> TestResult {
        let response: CartResponse = serde_json::from_str(
            r#"{"success": true, "discount_amount": 100, "total": 850, "cart_total": 1000}"#,
        )?;

        let totals = response.snapshot(iso::USD)?.totals.ok_or("missing totals")?;

        assert_eq!(totals.total().to_minor_units(), 90_000);

        Ok(())
    }

    #[test]
    fn remove_snapshot_has_no_discount() -> TestResult {
        let response: CartResponse = serde_json::from_str(
            r#"{"success": true, "cart_quantity": 1, "cart_total": 250.5}"#,
        )?;

        let snapshot = response.snapshot(iso::USD)?;
        let totals = snapshot.totals.ok_or("missing totals")?;

        assert_eq!(snapshot.quantity, Some(1));
        assert_eq!(totals.subtotal(), totals.total());
        assert!(!totals.has_discount());

        Ok(())
    }

    #[test]
    fn response_without_amounts_has_no_totals() -> TestResult {
        let response: CartResponse =
            serde_json::from_str(r#"{"success": true, "added": true, "cart_quantity": 3}"#)?;

        assert_eq!(response.snapshot(iso::USD)?, CartSnapshot::with_quantity(3));

        Ok(())
    }

    #[test]
    fn blank_message_is_ignored() {
        let response = CartResponse {
            message: Some("   ".to_string()),
            ..CartResponse::default()
        };

        assert_eq!(response.message(), None);
    }

    #[test]
    fn item_request_uses_wire_names() -> TestResult {
        let body = serde_json::to_value(ItemRequest::from(&CartItemRef::new(
            "42",
            ItemType::Course,
        )))?;

        assert_eq!(
            body,
            serde_json::json!({"product_id": "42", "product_type": "course"})
        );

        Ok(())
    }
}
