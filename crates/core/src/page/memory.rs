//! In-memory page.

use std::{cell::RefCell, collections::BTreeMap};

use rusty_money::{Money, iso::Currency};

use super::{AmountField, Page, TriggerBinding, TriggerId, TriggerKind, TriggerState};
use crate::{
    items::{CartItemRef, DataAttributes},
    notify::Severity,
};

/// Rendered state of one trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerView {
    /// Action kind.
    pub kind: TriggerKind,

    /// Current state.
    pub state: TriggerState,

    /// Current label.
    pub label: String,
}

#[derive(Debug)]
struct Row {
    item: CartItemRef,
    exiting: bool,
}

#[derive(Debug, Default)]
struct PageState {
    bindings: Vec<TriggerBinding>,
    views: BTreeMap<TriggerId, TriggerView>,
    rows: Vec<Row>,
    badge: Option<u32>,
    badges_visible: bool,
    summary_quantity: Option<u32>,
    amounts: BTreeMap<AmountField, Money<'static, Currency>>,
    discount_line: Option<Money<'static, Currency>>,
    reloads: usize,
    coupon_code: String,
    coupon_locked: bool,
    coupon_message: Option<(String, Severity)>,
    terms_accepted: bool,
    terms_focused: bool,
    sections: BTreeMap<String, bool>,
    fields: BTreeMap<String, String>,
    invalid_fields: Vec<String>,
    revealed_error: Option<String>,
}

/// Page held in memory, for headless drivers and tests.
#[derive(Debug, Default)]
pub struct MemoryPage {
    state: RefCell<PageState>,
}

fn item_attributes(item: &CartItemRef) -> DataAttributes {
    let attributes = DataAttributes::new()
        .with("itemId", item.item_id())
        .with("itemType", item.item_type().as_str());

    match item.display_name() {
        Some(name) => attributes.with("itemName", name),
        None => attributes,
    }
}

impl MemoryPage {
    /// Start building a page.
    pub fn builder() -> MemoryPageBuilder {
        MemoryPageBuilder::default()
    }

    /// Rendered state of a trigger.
    pub fn trigger(&self, id: &TriggerId) -> Option<TriggerView> {
        self.state.borrow().views.get(id).cloned()
    }

    /// Every trigger still on the page with its rendered state, in page order.
    pub fn trigger_views(&self) -> Vec<(TriggerId, TriggerView)> {
        let state = self.state.borrow();

        state
            .bindings
            .iter()
            .filter_map(|binding| {
                state
                    .views
                    .get(&binding.id)
                    .map(|view| (binding.id.clone(), view.clone()))
            })
            .collect()
    }

    /// Items whose rows are still listed.
    pub fn rows(&self) -> Vec<CartItemRef> {
        self.state
            .borrow()
            .rows
            .iter()
            .map(|row| row.item.clone())
            .collect()
    }

    /// Whether an item's row is mid exit transition.
    pub fn is_row_exiting(&self, item: &CartItemRef) -> bool {
        self.state
            .borrow()
            .rows
            .iter()
            .any(|row| row.exiting && row.item.same_line(item))
    }

    /// Quantity shown on the badges, if ever set.
    pub fn badge(&self) -> Option<u32> {
        self.state.borrow().badge
    }

    /// Whether the badges are visible.
    pub fn badges_visible(&self) -> bool {
        self.state.borrow().badges_visible
    }

    /// Item count of the summary panel, if ever set.
    pub fn summary_quantity(&self) -> Option<u32> {
        self.state.borrow().summary_quantity
    }

    /// Amount shown in a region, if ever set.
    pub fn amount(&self, field: AmountField) -> Option<Money<'static, Currency>> {
        self.state.borrow().amounts.get(&field).copied()
    }

    /// Discount line, if shown.
    pub fn discount_line(&self) -> Option<Money<'static, Currency>> {
        self.state.borrow().discount_line
    }

    /// How many times the page was reloaded.
    pub fn reloads(&self) -> usize {
        self.state.borrow().reloads
    }

    /// Type into the coupon input.
    pub fn set_coupon_code(&self, code: &str) {
        code.clone_into(&mut self.state.borrow_mut().coupon_code);
    }

    /// Whether the coupon input is read-only.
    pub fn coupon_locked(&self) -> bool {
        self.state.borrow().coupon_locked
    }

    /// Text of the coupon message region.
    pub fn coupon_message(&self) -> Option<(String, Severity)> {
        self.state.borrow().coupon_message.clone()
    }

    /// Tick or untick the terms checkbox.
    pub fn set_terms_accepted(&self, accepted: bool) {
        self.state.borrow_mut().terms_accepted = accepted;
    }

    /// Whether focus was moved to the terms checkbox.
    pub fn terms_focused(&self) -> bool {
        self.state.borrow().terms_focused
    }

    /// Field last revealed as invalid.
    pub fn revealed_error(&self) -> Option<String> {
        self.state.borrow().revealed_error.clone()
    }
}

impl Page for MemoryPage {
    fn triggers(&self) -> Vec<TriggerBinding> {
        self.state.borrow().bindings.clone()
    }

    fn render_trigger(&self, id: &TriggerId, state: TriggerState, label: &str) {
        if let Some(view) = self.state.borrow_mut().views.get_mut(id) {
            view.state = state;
            label.clone_into(&mut view.label);
        }
    }

    fn set_badges(&self, quantity: u32, visible: bool) {
        let mut state = self.state.borrow_mut();

        state.badge = Some(quantity);
        state.badges_visible = visible;
    }

    fn set_summary_quantity(&self, quantity: u32) {
        self.state.borrow_mut().summary_quantity = Some(quantity);
    }

    fn set_amount(&self, field: AmountField, amount: Money<'static, Currency>) {
        self.state.borrow_mut().amounts.insert(field, amount);
    }

    fn set_discount_line(&self, discount: Option<Money<'static, Currency>>) {
        self.state.borrow_mut().discount_line = discount;
    }

    fn begin_row_exit(&self, item: &CartItemRef) {
        for row in &mut self.state.borrow_mut().rows {
            if row.item.same_line(item) {
                row.exiting = true;
            }
        }
    }

    fn remove_row(&self, item: &CartItemRef) -> usize {
        let mut state = self.state.borrow_mut();

        state.rows.retain(|row| !row.item.same_line(item));
        state.bindings.retain(|binding| {
            binding.kind != TriggerKind::RemoveItem
                || !CartItemRef::from_attributes(&binding.attributes)
                    .is_ok_and(|bound| bound.same_line(item))
        });

        state.rows.len()
    }

    fn reload(&self) {
        self.state.borrow_mut().reloads += 1;
    }

    fn coupon_code(&self) -> String {
        self.state.borrow().coupon_code.clone()
    }

    fn set_coupon_locked(&self, locked: bool) {
        self.state.borrow_mut().coupon_locked = locked;
    }

    fn set_coupon_message(&self, message: &str, severity: Severity) {
        self.state.borrow_mut().coupon_message = Some((message.to_string(), severity));
    }

    fn terms_accepted(&self) -> bool {
        self.state.borrow().terms_accepted
    }

    fn focus_terms(&self) {
        self.state.borrow_mut().terms_focused = true;
    }

    fn section_expanded(&self, section: &str) -> Option<bool> {
        self.state.borrow().sections.get(section).copied()
    }

    fn set_section_expanded(&self, section: &str, expanded: bool) {
        if let Some(current) = self.state.borrow_mut().sections.get_mut(section) {
            *current = expanded;
        }
    }

    fn field_value(&self, field: &str) -> Option<String> {
        self.state.borrow().fields.get(field).cloned()
    }

    fn set_field_value(&self, field: &str, value: &str) {
        if let Some(current) = self.state.borrow_mut().fields.get_mut(field) {
            value.clone_into(current);
        }
    }

    fn reveal_first_error(&self) -> Option<String> {
        let mut state = self.state.borrow_mut();
        let first = state.invalid_fields.first().cloned();

        state.revealed_error.clone_from(&first);

        first
    }
}

/// Builder for [`MemoryPage`].
#[derive(Debug, Default)]
pub struct MemoryPageBuilder {
    state: PageState,
}

impl MemoryPageBuilder {
    /// Add an arbitrary trigger.
    #[must_use]
    pub fn trigger(mut self, binding: TriggerBinding) -> Self {
        self.state.views.insert(
            binding.id.clone(),
            TriggerView {
                kind: binding.kind,
                state: binding.state,
                label: binding.label.clone(),
            },
        );
        self.state.bindings.push(binding);
        self
    }

    /// Add-to-cart button for `item`, with id `add-{type}-{id}`.
    #[must_use]
    pub fn add_button(self, item: &CartItemRef) -> Self {
        self.trigger(TriggerBinding {
            id: TriggerId::add_item(item),
            kind: TriggerKind::AddItem,
            label: "Add to cart".to_string(),
            state: TriggerState::Idle,
            attributes: item_attributes(item),
        })
    }

    /// Cart row for `item` with its remove button, id `remove-{type}-{id}`.
    #[must_use]
    pub fn row(mut self, item: &CartItemRef) -> Self {
        self.state.rows.push(Row {
            item: item.clone(),
            exiting: false,
        });

        self.trigger(TriggerBinding {
            id: TriggerId::remove_item(item),
            kind: TriggerKind::RemoveItem,
            label: "Remove".to_string(),
            state: TriggerState::Idle,
            attributes: DataAttributes::new().inherit(&item_attributes(item)),
        })
    }

    /// Clear-cart button, id `clear-cart`.
    #[must_use]
    pub fn clear_button(self) -> Self {
        self.trigger(TriggerBinding {
            id: TriggerId::new("clear-cart"),
            kind: TriggerKind::ClearCart,
            label: "Empty cart".to_string(),
            state: TriggerState::Idle,
            attributes: DataAttributes::new(),
        })
    }

    /// Coupon input holding `code` and its apply button, id `apply-coupon`.
    #[must_use]
    pub fn coupon(mut self, code: &str) -> Self {
        code.clone_into(&mut self.state.coupon_code);

        self.trigger(TriggerBinding {
            id: TriggerId::new("apply-coupon"),
            kind: TriggerKind::ApplyCoupon,
            label: "Apply".to_string(),
            state: TriggerState::Idle,
            attributes: DataAttributes::new(),
        })
    }

    /// Coupon `code` already applied by the server: a locked input and a remove button.
    #[must_use]
    pub fn applied_coupon(mut self, code: &str) -> Self {
        code.clone_into(&mut self.state.coupon_code);
        self.state.coupon_locked = true;

        self.trigger(TriggerBinding {
            id: TriggerId::new("apply-coupon"),
            kind: TriggerKind::ApplyCoupon,
            label: "Remove".to_string(),
            state: TriggerState::CouponApplied,
            attributes: DataAttributes::new(),
        })
    }

    /// Checkout form submit, id `place-order`, and its terms checkbox.
    #[must_use]
    pub fn checkout(mut self, terms_accepted: bool) -> Self {
        self.state.terms_accepted = terms_accepted;

        self.trigger(TriggerBinding {
            id: TriggerId::new("place-order"),
            kind: TriggerKind::CheckoutSubmit,
            label: "Place order".to_string(),
            state: TriggerState::Idle,
            attributes: DataAttributes::new(),
        })
    }

    /// Initial summary amounts.
    #[must_use]
    pub fn summary(mut self, quantity: u32, subtotal: Money<'static, Currency>) -> Self {
        self.state.summary_quantity = Some(quantity);
        self.state.amounts.insert(AmountField::Subtotal, subtotal);
        self.state.amounts.insert(AmountField::Total, subtotal);
        self
    }

    /// Collapsible section.
    #[must_use]
    pub fn section(mut self, id: &str, expanded: bool) -> Self {
        self.state.sections.insert(id.to_string(), expanded);
        self
    }

    /// Form field with an initial value.
    #[must_use]
    pub fn field(mut self, id: &str, value: &str) -> Self {
        self.state.fields.insert(id.to_string(), value.to_string());
        self
    }

    /// Form field rendered with a validation error.
    #[must_use]
    pub fn invalid_field(mut self, id: &str, value: &str) -> Self {
        self.state.invalid_fields.push(id.to_string());
        self.field(id, value)
    }

    /// Finish the page.
    pub fn build(self) -> MemoryPage {
        MemoryPage {
            state: RefCell::new(self.state),
        }
    }
}
