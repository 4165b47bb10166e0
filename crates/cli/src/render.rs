//! Terminal report of a run: outcome, page state, triggers and notifications

use std::io;

use cartsync::{
    dispatcher::Activation,
    items::CartItemRef,
    notify::Notification,
    page::{AmountField, MemoryPage, TriggerKind, TriggerState},
};
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{Color, Style, Theme, object::Rows},
};

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Quantity read from the server.
    Count(u32),

    /// Whether an item is in the cart.
    InCart(CartItemRef, bool),

    /// How a trigger activation ended.
    Activation(Activation),
}

/// Write the whole report.
///
/// # Errors
///
/// Returns an error if `out` cannot be written.
pub fn write_report(
    out: &mut impl io::Write,
    outcome: &Outcome,
    page: &MemoryPage,
    notifications: &[Notification],
) -> io::Result<()> {
    write_outcome(out, outcome)?;

    if matches!(outcome, Outcome::Activation(_)) {
        write_page(out, page)?;
        write_triggers(out, page)?;
    }

    write_notifications(out, notifications)
}

fn write_outcome(out: &mut impl io::Write, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Outcome::Count(quantity) => writeln!(out, "Cart quantity: {quantity}"),
        Outcome::InCart(item, in_cart) => writeln!(
            out,
            "{} {} {} in the cart",
            item.item_type(),
            item.item_id(),
            if *in_cart { "is" } else { "is not" }
        ),
        Outcome::Activation(activation) => writeln!(out, "{}", describe(activation)),
    }
}

fn describe(activation: &Activation) -> String {
    match activation {
        Activation::Applied => "Applied".to_string(),
        Activation::Failed(error) => format!("Failed: {error}"),
        Activation::Declined => "Declined".to_string(),
        Activation::Busy => "Busy".to_string(),
        Activation::Unbound => "Unbound".to_string(),
        Activation::Submit => "Ready to submit".to_string(),
    }
}

fn money(amount: Option<Money<'static, Currency>>) -> String {
    amount.map(|amount| amount.to_string()).unwrap_or_default()
}

fn write_page(out: &mut impl io::Write, page: &MemoryPage) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Region", "Value"]);
    builder.push_record([
        "Badge".to_string(),
        page.badge().map(|q| q.to_string()).unwrap_or_default(),
    ]);
    builder.push_record([
        "Badge visible".to_string(),
        page.badges_visible().to_string(),
    ]);
    builder.push_record([
        "Items".to_string(),
        page.summary_quantity()
            .map(|q| q.to_string())
            .unwrap_or_default(),
    ]);
    builder.push_record([
        "Subtotal".to_string(),
        money(page.amount(AmountField::Subtotal)),
    ]);
    builder.push_record(["Discount".to_string(), money(page.discount_line())]);
    builder.push_record(["Total".to_string(), money(page.amount(AmountField::Total))]);
    builder.push_record([
        "Checkout price".to_string(),
        money(page.amount(AmountField::CheckoutButton)),
    ]);
    builder.push_record([
        "Coupon".to_string(),
        page.coupon_message()
            .map(|(message, severity)| format!("{severity}: {message}"))
            .unwrap_or_default(),
    ]);
    builder.push_record(["Rows".to_string(), page.rows().len().to_string()]);
    builder.push_record(["Reloads".to_string(), page.reloads().to_string()]);

    write_table(out, builder)
}

fn kind_name(kind: TriggerKind) -> &'static str {
    match kind {
        TriggerKind::AddItem => "add",
        TriggerKind::RemoveItem => "remove",
        TriggerKind::ClearCart => "clear",
        TriggerKind::ApplyCoupon => "coupon",
        TriggerKind::CheckoutSubmit => "checkout",
    }
}

fn state_name(state: TriggerState) -> &'static str {
    match state {
        TriggerState::Idle => "idle",
        TriggerState::Pending => "pending",
        TriggerState::Added => "added",
        TriggerState::AlreadyInCart => "already in cart",
        TriggerState::CouponApplied => "coupon applied",
        TriggerState::Submitting => "submitting",
    }
}

fn write_triggers(out: &mut impl io::Write, page: &MemoryPage) -> io::Result<()> {
    let views = page.trigger_views();

    if views.is_empty() {
        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Trigger", "Action", "State", "Label"]);

    for (id, view) in views {
        builder.push_record([
            id.to_string(),
            kind_name(view.kind).to_string(),
            state_name(view.state).to_string(),
            view.label,
        ]);
    }

    write_table(out, builder)
}

fn write_notifications(
    out: &mut impl io::Write,
    notifications: &[Notification],
) -> io::Result<()> {
    if notifications.is_empty() {
        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Severity", "Message", "Shown for"]);

    for notification in notifications {
        builder.push_record([
            notification.severity.to_string(),
            notification.message.clone(),
            format!("{}ms", notification.duration.as_millis()),
        ]);
    }

    write_table(out, builder)
}

fn write_table(out: &mut impl io::Write, builder: Builder) -> io::Result<()> {
    let mut table = builder.build();

    table.with(Theme::from(Style::modern_rounded()));
    table.modify(Rows::first(), Color::BOLD);

    writeln!(out, "\n{table}")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cartsync::{executor::ActionError, items::ItemType, notify::Severity};
    use testresult::TestResult;

    use super::*;

    fn rendered(
        outcome: &Outcome,
        page: &MemoryPage,
        notifications: &[Notification],
    ) -> Result<String, Box<dyn std::error::Error>> {
        let mut out = Vec::new();

        write_report(&mut out, outcome, page, notifications)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn activation_report_lists_page_and_triggers() -> TestResult {
        let item = CartItemRef::new("42", ItemType::Product);
        let page = MemoryPage::builder().add_button(&item).build();

        let report = rendered(&Outcome::Activation(Activation::Applied), &page, &[])?;

        assert!(report.starts_with("Applied\n"));
        assert!(report.contains("Badge visible"));
        assert!(report.contains("add-product-42"));
        assert!(report.contains("Add to cart"));
        assert!(!report.contains("Severity"));

        Ok(())
    }

    #[test]
    fn count_report_skips_page_tables() -> TestResult {
        let report = rendered(&Outcome::Count(3), &MemoryPage::default(), &[])?;

        assert_eq!(report, "Cart quantity: 3\n");

        Ok(())
    }

    #[test]
    fn failures_and_notifications_are_shown() -> TestResult {
        let notification = Notification {
            id: 0,
            message: "Network error".to_string(),
            severity: Severity::Error,
            duration: Duration::from_millis(5000),
            shown_at: tokio::time::Instant::now(),
        };

        let report = rendered(
            &Outcome::Activation(Activation::Failed(ActionError::Network(
                "request timed out".to_string(),
            ))),
            &MemoryPage::default(),
            &[notification],
        )?;

        assert!(report.starts_with("Failed: "));
        assert!(report.contains("Network error"));
        assert!(report.contains("5000ms"));

        Ok(())
    }

    #[test]
    fn in_cart_report_names_the_item() -> TestResult {
        let item = CartItemRef::new("7", ItemType::Course);

        let report = rendered(&Outcome::InCart(item, false), &MemoryPage::default(), &[])?;

        assert_eq!(report, "course 7 is not in the cart\n");

        Ok(())
    }
}
