//! Page surface
//!
//! The parts of the server-rendered document the client reads and writes. Browsers bind this
//! to the DOM; [`MemoryPage`] keeps it in memory for headless drivers and tests.

use std::fmt;

use mockall::automock;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    items::{CartItemRef, DataAttributes},
    notify::Severity,
};

mod memory;

pub use memory::{MemoryPage, MemoryPageBuilder, TriggerView};

/// Stable id of one interactive element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerId(String);

impl TriggerId {
    /// Wrap an element id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the add-to-cart button for `item`: `add-{type}-{id}`.
    pub fn add_item(item: &CartItemRef) -> Self {
        Self(format!("add-{}-{}", item.item_type(), item.item_id()))
    }

    /// Id of the remove button on `item`'s row: `remove-{type}-{id}`.
    pub fn remove_item(item: &CartItemRef) -> Self {
        Self(format!("remove-{}-{}", item.item_type(), item.item_id()))
    }

    /// The element id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TriggerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What activating a trigger does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    /// Add-to-cart button.
    AddItem,

    /// Remove button on a cart row.
    RemoveItem,

    /// Clear-cart button.
    ClearCart,

    /// Coupon apply/remove button.
    ApplyCoupon,

    /// Checkout form submit.
    CheckoutSubmit,
}

/// One trigger as found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerBinding {
    /// Element id.
    pub id: TriggerId,

    /// Action kind.
    pub kind: TriggerKind,

    /// Label as rendered by the server, restored when the trigger returns to idle.
    pub label: String,

    /// State as rendered by the server.
    pub state: TriggerState,

    /// Data attributes of the trigger merged with those of its enclosing row.
    pub attributes: DataAttributes,
}

/// Visible state of a trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerState {
    /// Enabled, original label.
    #[default]
    Idle,

    /// Disabled while its request is in flight.
    Pending,

    /// Disabled for good: the item was added.
    Added,

    /// Enabled, showing that the item was already in the cart.
    AlreadyInCart,

    /// Enabled, now acting as "remove coupon".
    CouponApplied,

    /// Disabled while the form submits natively.
    Submitting,
}

impl TriggerState {
    /// Whether the element is rendered disabled.
    pub fn is_disabled(self) -> bool {
        matches!(
            self,
            TriggerState::Pending | TriggerState::Added | TriggerState::Submitting
        )
    }
}

/// Amount regions of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmountField {
    /// Pre-discount amount.
    Subtotal,

    /// Amount payable.
    Total,

    /// Price shown on the place-order button.
    CheckoutButton,
}

/// The document surface the client drives.
#[automock]
pub trait Page {
    /// Every trigger currently on the page.
    fn triggers(&self) -> Vec<TriggerBinding>;

    /// Render `state` on a trigger with `label`.
    fn render_trigger(&self, id: &TriggerId, state: TriggerState, label: &str);

    /// Set every cart badge and count marker.
    fn set_badges(&self, quantity: u32, visible: bool);

    /// Set the item count of the summary panel.
    fn set_summary_quantity(&self, quantity: u32);

    /// Set one amount region.
    fn set_amount(&self, field: AmountField, amount: Money<'static, Currency>);

    /// Show the discount line with `discount`, creating it if needed, or remove it.
    fn set_discount_line(&self, discount: Option<Money<'static, Currency>>);

    /// Start the exit transition of an item's row.
    fn begin_row_exit(&self, item: &CartItemRef);

    /// Remove an item's row, returning how many rows remain.
    fn remove_row(&self, item: &CartItemRef) -> usize;

    /// Reload the whole page from the server.
    fn reload(&self);

    /// Current contents of the coupon input.
    fn coupon_code(&self) -> String;

    /// Make the coupon input read-only or editable.
    fn set_coupon_locked(&self, locked: bool);

    /// Write into the coupon message region.
    fn set_coupon_message(&self, message: &str, severity: Severity);

    /// Whether the terms checkbox is checked.
    fn terms_accepted(&self) -> bool;

    /// Move focus to the terms checkbox.
    fn focus_terms(&self);

    /// Whether a collapsible section is expanded. `None` if there is no such section.
    fn section_expanded(&self, section: &str) -> Option<bool>;

    /// Expand or collapse a section.
    fn set_section_expanded(&self, section: &str, expanded: bool);

    /// Current value of a form field.
    fn field_value(&self, field: &str) -> Option<String>;

    /// Overwrite a form field.
    fn set_field_value(&self, field: &str, value: &str);

    /// Scroll to and focus the first field with a validation error, returning its id.
    fn reveal_first_error(&self) -> Option<String>;
}
