//! Subcommands
//!
//! Each action command lays out a page holding just the trigger it needs, then activates it
//! the way a click would.

use std::{io, rc::Rc};

use cartsync::{
    client::CartSyncClient,
    confirm::{Confirm, StaticConfirm},
    dispatcher::Activation,
    items::{CartItemRef, ItemType},
    notify::NotificationStack,
    page::{MemoryPage, Page, TriggerId},
    transport::HttpTransport,
};
use clap::Subcommand;
use tracing::debug;

use crate::{
    config::CliConfig,
    confirm::TerminalConfirm,
    errors::CliError,
    render::{self, Outcome},
};

const SESSION_COOKIE: &str = "sessionid";

/// Cart actions.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show how many items the cart holds.
    Count,

    /// Ask whether an item is in the cart.
    Check {
        /// Item id.
        id: String,

        /// Item type.
        #[arg(long = "type", default_value = "course")]
        item_type: ItemType,
    },

    /// Add an item to the cart.
    Add {
        /// Item id.
        id: String,

        /// Item type.
        #[arg(long = "type", default_value = "course")]
        item_type: ItemType,
    },

    /// Remove an item from the cart.
    Remove {
        /// Item id.
        id: String,

        /// Item type.
        #[arg(long = "type", default_value = "course")]
        item_type: ItemType,

        /// Name shown in the confirmation prompt.
        #[arg(long)]
        name: Option<String>,
    },

    /// Empty the cart.
    Clear,

    /// Apply a coupon code.
    Coupon {
        /// Coupon code.
        code: String,
    },

    /// Remove the applied coupon.
    RemoveCoupon,

    /// Check the checkout form is ready to submit.
    Checkout {
        /// Tick the terms checkbox.
        #[arg(long)]
        accept_terms: bool,
    },
}

impl Command {
    /// Item the command is about, if any.
    pub fn item(&self) -> Option<CartItemRef> {
        match self {
            Command::Check { id, item_type } | Command::Add { id, item_type } => {
                Some(CartItemRef::new(id.as_str(), *item_type))
            }
            Command::Remove {
                id,
                item_type,
                name,
            } => {
                let item = CartItemRef::new(id.as_str(), *item_type);

                Some(match name {
                    Some(name) => item.with_display_name(name.as_str()),
                    None => item,
                })
            }
            Command::Count
            | Command::Clear
            | Command::Coupon { .. }
            | Command::RemoveCoupon
            | Command::Checkout { .. } => None,
        }
    }

    /// Page holding the command's trigger.
    pub fn page(&self) -> MemoryPage {
        let builder = MemoryPage::builder();

        let builder = match (self, self.item()) {
            (Command::Add { .. }, Some(item)) => builder.add_button(&item),
            (Command::Remove { .. }, Some(item)) => builder.row(&item),
            (Command::Clear, _) => builder.clear_button(),
            (Command::Coupon { code }, _) => builder.coupon(code),
            (Command::RemoveCoupon, _) => builder.applied_coupon(""),
            (Command::Checkout { accept_terms }, _) => builder.checkout(*accept_terms),
            _ => builder,
        };

        builder.build()
    }

    /// Trigger the command activates.
    pub fn trigger(&self) -> Option<TriggerId> {
        match self {
            Command::Add { .. } => self.item().map(|item| TriggerId::add_item(&item)),
            Command::Remove { .. } => self.item().map(|item| TriggerId::remove_item(&item)),
            Command::Clear => Some(TriggerId::new("clear-cart")),
            Command::Coupon { .. } | Command::RemoveCoupon => Some(TriggerId::new("apply-coupon")),
            Command::Checkout { .. } => Some(TriggerId::new("place-order")),
            Command::Count | Command::Check { .. } => None,
        }
    }
}

fn transport(cli: &CliConfig, csrf_cookie: &str) -> Result<HttpTransport, CliError> {
    let transport = HttpTransport::new(&cli.base_url)?;

    if let Some(token) = &cli.csrf_token {
        transport.add_cookie(&format!("{csrf_cookie}={token}; Path=/"));
    }

    if let Some(session) = &cli.session {
        transport.add_cookie(&format!("{SESSION_COOKIE}={session}; Path=/"));
    }

    Ok(transport)
}

/// Run the selected command and write its report to `out`.
///
/// # Errors
///
/// Returns an error if the client cannot be set up, the output cannot be written, or the
/// action failed.
pub async fn run(cli: &CliConfig, out: &mut impl io::Write) -> Result<(), CliError> {
    let config = cli.client_config()?;
    let transport = Rc::new(transport(cli, &config.csrf_cookie)?);
    let page = Rc::new(cli.command.page());
    let notifications = Rc::new(NotificationStack::new());

    let confirm: Rc<dyn Confirm> = if cli.yes {
        Rc::new(StaticConfirm(true))
    } else {
        Rc::new(TerminalConfirm)
    };

    let client = CartSyncClient::new(
        config,
        transport,
        Rc::clone(&page) as Rc<dyn Page>,
        Rc::clone(&notifications) as _,
        confirm,
    )?;

    let outcome = match &cli.command {
        Command::Count => Outcome::Count(client.refresh_count().await?),
        Command::Check { id, item_type } => {
            let item = CartItemRef::new(id.as_str(), *item_type);
            let in_cart = client.check_in_cart(&item).await?;

            Outcome::InCart(item, in_cart)
        }
        command => {
            let trigger = command.trigger().ok_or(CliError::Unbound)?;
            let bound = client.init().await;

            debug!(bound, %trigger, "activating");

            Outcome::Activation(client.activate(&trigger).await)
        }
    };

    render::write_report(out, &outcome, &page, &notifications.entries())?;

    match outcome {
        Outcome::Activation(Activation::Failed(error)) => Err(CliError::Action(error)),
        Outcome::Activation(Activation::Unbound) => Err(CliError::Unbound),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use cartsync::page::{TriggerKind, TriggerState};

    use super::*;

    #[test]
    fn add_lays_out_its_button() {
        let command = Command::Add {
            id: "42".to_string(),
            item_type: ItemType::Product,
        };
        let page = command.page();
        let trigger = command.trigger();

        assert_eq!(trigger, Some(TriggerId::from("add-product-42")));
        assert_eq!(
            trigger
                .and_then(|id| page.trigger(&id))
                .map(|view| view.kind),
            Some(TriggerKind::AddItem)
        );
    }

    #[test]
    fn remove_lays_out_a_named_row() {
        let command = Command::Remove {
            id: "7".to_string(),
            item_type: ItemType::Course,
            name: Some("Rust 101".to_string()),
        };

        let rows = command.page().rows();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows.first().and_then(CartItemRef::display_name),
            Some("Rust 101")
        );
        assert_eq!(command.trigger(), Some(TriggerId::from("remove-course-7")));
    }

    #[test]
    fn remove_coupon_starts_from_an_applied_coupon() {
        let page = Command::RemoveCoupon.page();

        assert!(page.coupon_locked());
        assert_eq!(
            page.trigger(&TriggerId::from("apply-coupon"))
                .map(|view| view.state),
            Some(TriggerState::CouponApplied)
        );
    }

    #[test]
    fn queries_have_no_trigger() {
        let check = Command::Check {
            id: "3".to_string(),
            item_type: ItemType::Course,
        };

        assert_eq!(Command::Count.trigger(), None);
        assert_eq!(check.trigger(), None);
        assert!(check.page().trigger_views().is_empty());
        assert_eq!(check.item().map(|item| item.item_id().to_string()), Some("3".to_string()));
    }

    #[test]
    fn checkout_carries_the_terms_box() {
        let page = Command::Checkout { accept_terms: true }.page();

        assert!(page.terms_accepted());
        assert!(page.trigger(&TriggerId::from("place-order")).is_some());
    }
}
