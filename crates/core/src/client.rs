//! Cart sync client
//!
//! Entry point tying the dispatcher, executor, projector and notifications to one page.

use std::{fmt, rc::Rc};

use tracing::{debug, info, warn};

use crate::{
    config::{ClientConfig, ConfigError},
    confirm::Confirm,
    dispatcher::{Activation, ActionDispatcher},
    executor::{ActionError, RequestExecutor},
    forms,
    items::CartItemRef,
    notify::{NotificationSink, Notifier},
    page::{Page, TriggerId},
    projector::StateProjector,
    transport::{Method, RequestBody, Transport},
};

/// Keeps one page in sync with the server's cart.
pub struct CartSyncClient {
    config: ClientConfig,
    page: Rc<dyn Page>,
    executor: Rc<RequestExecutor>,
    projector: Rc<StateProjector>,
    dispatcher: ActionDispatcher,
}

impl fmt::Debug for CartSyncClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartSyncClient")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl CartSyncClient {
    /// Wire a client for `page`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] if the configured currency is not recognised.
    pub fn new(
        config: ClientConfig,
        transport: Rc<dyn Transport>,
        page: Rc<dyn Page>,
        notifier: Rc<dyn Notifier>,
        confirm: Rc<dyn Confirm>,
    ) -> Result<Self, ConfigError> {
        let currency = config.currency()?;

        let executor = Rc::new(RequestExecutor::new(
            transport,
            config.csrf_cookie.clone(),
            config.timings.request_timeout(),
        ));
        let projector = Rc::new(StateProjector::new(Rc::clone(&page), config.timings));
        let notifications = NotificationSink::new(notifier, &config.timings);

        let dispatcher = ActionDispatcher::new(
            config.clone(),
            currency,
            Rc::clone(&executor),
            Rc::clone(&projector),
            notifications,
            confirm,
            Rc::clone(&page),
        );

        Ok(Self {
            config,
            page,
            executor,
            projector,
            dispatcher,
        })
    }

    /// Bind the page's triggers, sync the badges with the server and reveal the first invalid
    /// form field. Returns how many triggers were bound.
    pub async fn init(&self) -> usize {
        let bound = self.dispatcher.bind();

        if let Err(error) = self.refresh_count().await {
            warn!("could not refresh cart count: {error}");
        }

        if let Some(field) = self.page.reveal_first_error() {
            debug!(field, "revealed first invalid field");
        }

        info!(bound, "cart client ready");

        bound
    }

    /// The dispatcher behind [`CartSyncClient::activate`].
    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Run the action bound to a trigger.
    pub async fn activate(&self, id: &TriggerId) -> Activation {
        self.dispatcher.activate(id).await
    }

    /// Cancel one trigger's in-flight request.
    pub fn cancel(&self, id: &TriggerId) -> bool {
        self.dispatcher.cancel(id)
    }

    /// Cancel every in-flight request.
    pub fn navigate_away(&self) {
        self.dispatcher.navigate_away();
    }

    /// Read the cart quantity from the server and show it on the badges.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] if the count could not be read.
    pub async fn refresh_count(&self) -> Result<u32, ActionError> {
        let response = self
            .executor
            .execute(
                &self.config.endpoints.count,
                Method::Get,
                RequestBody::Empty,
                &self.executor.cancellation(),
            )
            .await?;

        let quantity = response.cart_quantity.unwrap_or_default();

        self.projector.apply_quantity(quantity);

        Ok(quantity)
    }

    /// Ask the server whether an item is in the cart.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] if the check could not be made.
    pub async fn check_in_cart(&self, item: &CartItemRef) -> Result<bool, ActionError> {
        let path = self
            .config
            .endpoints
            .check_path(item.item_id(), item.item_type().as_str());

        let response = self
            .executor
            .execute(
                &path,
                Method::Get,
                RequestBody::Empty,
                &self.executor.cancellation(),
            )
            .await?;

        Ok(response.in_cart.unwrap_or_default())
    }

    /// Toggle a collapsible section, returning its new state. Required sections stay expanded.
    pub fn toggle_section(&self, section: &str) -> Option<bool> {
        let expanded = self.page.section_expanded(section)?;
        let next = forms::toggled(section, expanded, &self.config.required_sections);

        self.page.set_section_expanded(section, next);

        Some(next)
    }

    /// Strip non-digits from the numeric form fields, returning how many fields changed.
    pub fn sanitize_numeric_fields(&self) -> usize {
        let mut changed = 0;

        for field in &self.config.numeric_fields {
            let Some(value) = self.page.field_value(field) else {
                continue;
            };

            let digits = forms::digits_only(&value);

            if digits != value {
                self.page.set_field_value(field, &digits);
                changed += 1;
            }
        }

        changed
    }
}
