//! State projector
//!
//! Writes server snapshots onto the page. Only the regions an action returned data for are
//! touched; removals and clears end in a full reload so the server renders the empty cart.

use std::{fmt, rc::Rc, time::Duration};

use tokio::time::sleep;
use tracing::debug;

use crate::{
    config::Timings,
    items::CartItemRef,
    notify::Severity,
    page::{AmountField, Page},
    snapshot::CartSnapshot,
};

/// Applies snapshots to a [`Page`].
pub struct StateProjector {
    page: Rc<dyn Page>,
    timings: Timings,
}

impl fmt::Debug for StateProjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateProjector")
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}

impl StateProjector {
    /// Create a projector writing to `page`.
    pub fn new(page: Rc<dyn Page>, timings: Timings) -> Self {
        Self { page, timings }
    }

    /// Set every badge to `quantity`, hiding them on an empty cart.
    pub fn apply_quantity(&self, quantity: u32) {
        self.page.set_badges(quantity, quantity > 0);
    }

    /// Project whatever the snapshot carries.
    pub fn apply_snapshot(&self, snapshot: &CartSnapshot) {
        if let Some(quantity) = snapshot.quantity {
            self.apply_quantity(quantity);
            self.page.set_summary_quantity(quantity);
        }

        if let Some(totals) = snapshot.totals {
            self.page.set_amount(AmountField::Subtotal, totals.subtotal());
            self.page.set_amount(AmountField::Total, totals.total());
            self.page
                .set_discount_line(totals.has_discount().then(|| totals.discount()));
        }
    }

    /// Project a coupon result: totals, the checkout price, and a locked coupon input.
    pub fn apply_coupon(&self, snapshot: &CartSnapshot, message: &str) {
        self.apply_snapshot(snapshot);

        if let Some(totals) = snapshot.totals {
            self.page.set_amount(AmountField::CheckoutButton, totals.total());
        }

        self.page.set_coupon_locked(true);
        self.page.set_coupon_message(message, Severity::Success);
    }

    /// Show a coupon failure next to the input, leaving it editable.
    pub fn coupon_failed(&self, message: &str) {
        self.page.set_coupon_message(message, Severity::Error);
    }

    /// Play the exit transition and drop an item's row. Reloads the page once the last row is
    /// gone, returning whether it did.
    pub async fn remove_row(&self, item: &CartItemRef) -> bool {
        self.page.begin_row_exit(item);

        sleep(self.timings.row_exit()).await;

        let remaining = self.page.remove_row(item);

        debug!(%item, remaining, "row removed");

        if remaining > 0 {
            return false;
        }

        self.reload_after(self.timings.empty_reload()).await;

        true
    }

    /// Reload the page after `delay`.
    pub async fn reload_after(&self, delay: Duration) {
        sleep(delay).await;

        debug!(?delay, "reloading page");

        self.page.reload();
    }
}

#[cfg(test)]
mod tests {
    use mockall::{Sequence, predicate::eq};
    use rusty_money::{Money, iso};
    use tokio::time::Instant;

    use crate::{
        items::ItemType,
        page::{MemoryPage, MockPage},
        snapshot::CartTotals,
    };

    use super::*;

    fn projector(page: &Rc<MemoryPage>) -> StateProjector {
        StateProjector::new(Rc::clone(page) as Rc<dyn Page>, Timings::default())
    }

    #[test]
    fn empty_cart_hides_badges() {
        let mut page = MockPage::new();

        page.expect_set_badges()
            .once()
            .with(eq(0), eq(false))
            .return_const(());

        StateProjector::new(Rc::new(page), Timings::default()).apply_quantity(0);
    }

    #[test]
    fn quantity_only_snapshot_leaves_amounts_alone() {
        let mut page = MockPage::new();

        page.expect_set_badges()
            .once()
            .with(eq(3), eq(true))
            .return_const(());
        page.expect_set_summary_quantity()
            .once()
            .with(eq(3))
            .return_const(());
        page.expect_set_amount().never();
        page.expect_set_discount_line().never();

        StateProjector::new(Rc::new(page), Timings::default())
            .apply_snapshot(&CartSnapshot::with_quantity(3));
    }

    #[test]
    fn zero_discount_removes_discount_line() {
        let page = Rc::new(MemoryPage::builder().build());

        projector(&page).apply_snapshot(&CartSnapshot {
            quantity: Some(1),
            totals: Some(CartTotals::from_minor(500, 0, iso::IRR)),
        });

        assert_eq!(page.discount_line(), None);
        assert_eq!(
            page.amount(AmountField::Total),
            Some(Money::from_minor(500, iso::IRR))
        );
    }

    #[test]
    fn coupon_updates_checkout_price_and_locks_input() {
        let page = Rc::new(MemoryPage::builder().coupon("SAVE10").build());

        projector(&page).apply_coupon(
            &CartSnapshot {
                quantity: None,
                totals: Some(CartTotals::from_minor(1_000, 100, iso::IRR)),
            },
            "Coupon applied",
        );

        assert_eq!(page.discount_line(), Some(Money::from_minor(100, iso::IRR)));
        assert_eq!(
            page.amount(AmountField::CheckoutButton),
            Some(Money::from_minor(900, iso::IRR))
        );
        assert!(page.coupon_locked());
        assert_eq!(
            page.coupon_message(),
            Some(("Coupon applied".to_string(), Severity::Success))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn last_row_reloads_after_exit_and_delay() {
        let item = CartItemRef::new("1", ItemType::Course);
        let page = Rc::new(MemoryPage::builder().row(&item).build());
        let started = Instant::now();

        let reloaded = projector(&page).remove_row(&item).await;

        assert!(reloaded);
        assert_eq!(page.reloads(), 1);
        assert_eq!(started.elapsed(), Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn other_rows_keep_the_page() {
        let first = CartItemRef::new("1", ItemType::Course);
        let second = CartItemRef::new("2", ItemType::Product);
        let page = Rc::new(MemoryPage::builder().row(&first).row(&second).build());

        let reloaded = projector(&page).remove_row(&second).await;

        assert!(!reloaded);
        assert_eq!(page.reloads(), 0);
        assert_eq!(page.rows(), vec![first]);
    }

    #[tokio::test(start_paused = true)]
    async fn row_exit_precedes_removal() {
        let item = CartItemRef::new("5", ItemType::Course);
        let mut page = MockPage::new();
        let mut sequence = Sequence::new();

        page.expect_begin_row_exit()
            .once()
            .in_sequence(&mut sequence)
            .return_const(());
        page.expect_remove_row()
            .once()
            .in_sequence(&mut sequence)
            .return_const(2_usize);
        page.expect_reload().never();

        assert!(!StateProjector::new(Rc::new(page), Timings::default())
            .remove_row(&item)
            .await);
    }
}
