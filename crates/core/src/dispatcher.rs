//! Action dispatcher
//!
//! Binds each page trigger to one cart action, resolved once at bind time, and runs that
//! action's flow on activation: guard, optional confirmation, request, then projection and a
//! notification. Triggers are independent; two different triggers may have requests in flight
//! at once and their responses are applied in whatever order they arrive.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    config::ClientConfig,
    confirm::Confirm,
    executor::{ActionError, ActionResult, RequestExecutor},
    guard::PendingActionGuard,
    items::{CartItemRef, ResolveError},
    notify::NotificationSink,
    page::{Page, TriggerBinding, TriggerId, TriggerKind, TriggerState},
    projector::StateProjector,
    snapshot::CartSnapshot,
    transport::{Method, RequestBody},
    wire::{CartResponse, ItemRequest},
};

/// What a trigger does, with the identity it acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add an item.
    Add(CartItemRef),

    /// Remove an item's line.
    Remove(CartItemRef),

    /// Empty the cart.
    Clear,

    /// Apply the code in the coupon input, or remove the applied coupon.
    ApplyCoupon,

    /// Submit the checkout form.
    CheckoutSubmit,
}

impl CartAction {
    /// Resolve the action a trigger performs.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if an item trigger lacks a usable identity.
    pub fn resolve(binding: &TriggerBinding) -> Result<Self, ResolveError> {
        match binding.kind {
            TriggerKind::AddItem => CartItemRef::from_attributes(&binding.attributes).map(Self::Add),
            TriggerKind::RemoveItem => {
                CartItemRef::from_attributes(&binding.attributes).map(Self::Remove)
            }
            TriggerKind::ClearCart => Ok(Self::Clear),
            TriggerKind::ApplyCoupon => Ok(Self::ApplyCoupon),
            TriggerKind::CheckoutSubmit => Ok(Self::CheckoutSubmit),
        }
    }
}

/// How an activation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The action succeeded and its result is on the page.
    Applied,

    /// The action failed; the trigger is usable again.
    Failed(ActionError),

    /// The user declined the confirmation; nothing was sent.
    Declined,

    /// The trigger's previous request is still outstanding, or the trigger is disabled.
    Busy,

    /// No usable action is bound to the trigger.
    Unbound,

    /// Checkout preconditions hold; the caller proceeds with native form submission.
    Submit,
}

#[derive(Debug)]
struct BoundTrigger {
    id: TriggerId,
    label: String,
    action: Result<CartAction, ResolveError>,
    endpoint: Option<String>,
    guard: PendingActionGuard,
    state: Cell<TriggerState>,
    in_flight: RefCell<Option<CancellationToken>>,
}

impl BoundTrigger {
    fn new(binding: TriggerBinding) -> Self {
        let action = CartAction::resolve(&binding);
        let guard = PendingActionGuard::new();

        if binding.state.is_disabled() {
            guard.lock();
        }

        Self {
            endpoint: binding.attributes.url().map(str::to_string),
            id: binding.id,
            label: binding.label,
            action,
            guard,
            state: Cell::new(binding.state),
            in_flight: RefCell::new(None),
        }
    }

    fn endpoint<'a>(&'a self, default: &'a str) -> &'a str {
        self.endpoint.as_deref().unwrap_or(default)
    }
}

/// Runs cart actions for page triggers.
pub struct ActionDispatcher {
    config: ClientConfig,
    currency: &'static Currency,
    executor: Rc<RequestExecutor>,
    projector: Rc<StateProjector>,
    notifications: NotificationSink,
    confirm: Rc<dyn Confirm>,
    page: Rc<dyn Page>,
    bindings: RefCell<FxHashMap<TriggerId, Rc<BoundTrigger>>>,
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("currency", &self.currency.iso_alpha_code)
            .field("bindings", &self.bindings.borrow().len())
            .finish_non_exhaustive()
    }
}

impl ActionDispatcher {
    /// Create a dispatcher with no bindings.
    pub fn new(
        config: ClientConfig,
        currency: &'static Currency,
        executor: Rc<RequestExecutor>,
        projector: Rc<StateProjector>,
        notifications: NotificationSink,
        confirm: Rc<dyn Confirm>,
        page: Rc<dyn Page>,
    ) -> Self {
        Self {
            config,
            currency,
            executor,
            projector,
            notifications,
            confirm,
            page,
            bindings: RefCell::new(FxHashMap::default()),
        }
    }

    /// Bind every trigger on the page that is not bound yet, returning how many were added.
    ///
    /// Triggers whose identity cannot be resolved are still bound, so activating them is a
    /// logged no-op rather than an unknown trigger. A different element reusing an id that is
    /// already bound stays unbound and is logged.
    pub fn bind(&self) -> usize {
        let mut bindings = self.bindings.borrow_mut();
        let mut added = 0;

        for binding in self.page.triggers() {
            if let Some(bound) = bindings.get(&binding.id) {
                if bound.action != CartAction::resolve(&binding) {
                    warn!(trigger = %binding.id, "duplicate trigger id, element left unbound");
                }

                continue;
            }

            let trigger = BoundTrigger::new(binding);

            if let Err(source) = &trigger.action {
                warn!(trigger = %trigger.id, "trigger bound without an action: {source}");
            }

            bindings.insert(trigger.id.clone(), Rc::new(trigger));
            added += 1;
        }

        debug!(added, total = bindings.len(), "triggers bound");

        added
    }

    /// Resolve a trigger again after its part of the page was re-rendered.
    pub fn rebind(&self, binding: TriggerBinding) {
        let trigger = BoundTrigger::new(binding);

        self.bindings
            .borrow_mut()
            .insert(trigger.id.clone(), Rc::new(trigger));
    }

    /// Number of bound triggers.
    pub fn bound(&self) -> usize {
        self.bindings.borrow().len()
    }

    /// Last state rendered on a trigger.
    pub fn trigger_state(&self, id: &TriggerId) -> Option<TriggerState> {
        self.trigger(id).map(|trigger| trigger.state.get())
    }

    /// Whether a trigger currently refuses activation.
    pub fn is_guarded(&self, id: &TriggerId) -> bool {
        self.trigger(id)
            .is_some_and(|trigger| trigger.guard.is_engaged())
    }

    /// Run the action bound to `id`.
    pub async fn activate(&self, id: &TriggerId) -> Activation {
        let Some(trigger) = self.trigger(id) else {
            warn!(trigger = %id, "activation of unknown trigger");

            return Activation::Unbound;
        };

        let action = match &trigger.action {
            Ok(action) => action.clone(),
            Err(source) => {
                error!(trigger = %id, "ignoring activation: {source}");

                return Activation::Unbound;
            }
        };

        if !trigger.guard.try_acquire() {
            debug!(trigger = %id, "trigger busy");

            return Activation::Busy;
        }

        debug!(trigger = %id, ?action, "activating");

        match action {
            CartAction::Add(item) => self.add(&trigger, &item).await,
            CartAction::Remove(item) => self.remove(&trigger, &item).await,
            CartAction::Clear => self.clear(&trigger).await,
            CartAction::ApplyCoupon if trigger.state.get() == TriggerState::CouponApplied => {
                self.remove_coupon(&trigger).await
            }
            CartAction::ApplyCoupon => self.apply_coupon(&trigger).await,
            CartAction::CheckoutSubmit => self.checkout(&trigger),
        }
    }

    /// Cancel a trigger's in-flight request. Returns whether one was outstanding.
    pub fn cancel(&self, id: &TriggerId) -> bool {
        let Some(trigger) = self.trigger(id) else {
            return false;
        };

        let token = trigger.in_flight.borrow().clone();

        token.is_some_and(|token| {
            token.cancel();

            true
        })
    }

    /// Cancel every in-flight request, as when the user leaves the page.
    pub fn navigate_away(&self) {
        info!("cancelling in-flight requests");

        self.executor.cancel_all();
    }

    fn trigger(&self, id: &TriggerId) -> Option<Rc<BoundTrigger>> {
        self.bindings.borrow().get(id).cloned()
    }

    fn render(&self, trigger: &BoundTrigger, state: TriggerState, label: &str) {
        trigger.state.set(state);
        self.page.render_trigger(&trigger.id, state, label);
    }

    fn restore(&self, trigger: &BoundTrigger) {
        trigger.guard.release();
        self.render(trigger, TriggerState::Idle, &trigger.label);
    }

    async fn send(
        &self,
        trigger: &BoundTrigger,
        endpoint: &str,
        body: RequestBody,
    ) -> ActionResult {
        let cancel = self.executor.cancellation();

        trigger.in_flight.replace(Some(cancel.clone()));

        let result = self
            .executor
            .execute(endpoint, Method::Post, body, &cancel)
            .await;

        trigger.in_flight.replace(None);

        result
    }

    fn snapshot(&self, response: &CartResponse) -> CartSnapshot {
        response.snapshot(self.currency).unwrap_or_else(|source| {
            error!("dropping unusable amounts: {source}");

            CartSnapshot {
                quantity: response.cart_quantity,
                totals: None,
            }
        })
    }

    fn fail(&self, error: ActionError, fallback: &str) -> Activation {
        let messages = &self.config.messages;

        self.notifications
            .error(&error.user_message(fallback, &messages.network_error));

        Activation::Failed(error)
    }

    async fn add(&self, trigger: &BoundTrigger, item: &CartItemRef) -> Activation {
        let messages = &self.config.messages;

        self.render(trigger, TriggerState::Pending, &messages.adding_label);

        let body = RequestBody::from(ItemRequest::from(item));
        let endpoint = trigger.endpoint(&self.config.endpoints.add);

        match self.send(trigger, endpoint, body).await {
            Ok(response) => {
                if let Some(quantity) = response.cart_quantity {
                    self.projector.apply_quantity(quantity);
                }

                if response.added == Some(false) {
                    trigger.guard.release();
                    self.render(
                        trigger,
                        TriggerState::AlreadyInCart,
                        &messages.already_in_cart_label,
                    );
                    self.notifications
                        .info(response.message().unwrap_or(&messages.already_in_cart));
                } else {
                    trigger.guard.lock();
                    self.render(trigger, TriggerState::Added, &messages.added_label);
                    self.notifications
                        .success(response.message().unwrap_or(&messages.add_success));
                }

                Activation::Applied
            }
            Err(error) => {
                self.restore(trigger);

                self.fail(error, &messages.add_error)
            }
        }
    }

    async fn remove(&self, trigger: &BoundTrigger, item: &CartItemRef) -> Activation {
        let messages = &self.config.messages;

        if !self
            .confirm
            .confirm(&messages.remove_prompt(item.display_name()))
            .await
        {
            trigger.guard.release();

            return Activation::Declined;
        }

        self.render(trigger, TriggerState::Pending, &trigger.label);

        let body = RequestBody::from(ItemRequest::from(item));
        let endpoint = trigger.endpoint(&self.config.endpoints.remove);

        match self.send(trigger, endpoint, body).await {
            Ok(response) => {
                trigger.guard.lock();

                self.projector.apply_snapshot(&self.snapshot(&response));
                self.notifications
                    .success(response.message().unwrap_or(&messages.remove_success));
                self.projector.remove_row(item).await;

                Activation::Applied
            }
            Err(error) => {
                self.restore(trigger);

                self.fail(error, &messages.remove_error)
            }
        }
    }

    async fn clear(&self, trigger: &BoundTrigger) -> Activation {
        let messages = &self.config.messages;

        if !self.confirm.confirm(&messages.clear_confirm).await {
            trigger.guard.release();

            return Activation::Declined;
        }

        self.render(trigger, TriggerState::Pending, &trigger.label);

        let endpoint = trigger.endpoint(&self.config.endpoints.clear);

        match self.send(trigger, endpoint, RequestBody::Empty).await {
            Ok(response) => {
                trigger.guard.lock();

                self.projector.apply_snapshot(&self.snapshot(&response));
                self.notifications
                    .success(response.message().unwrap_or(&messages.clear_success));
                self.projector
                    .reload_after(self.config.timings.clear_reload())
                    .await;

                Activation::Applied
            }
            Err(error) => {
                self.restore(trigger);

                self.fail(error, &messages.clear_error)
            }
        }
    }

    async fn apply_coupon(&self, trigger: &BoundTrigger) -> Activation {
        let messages = &self.config.messages;
        let code = self.page.coupon_code().trim().to_string();

        if code.is_empty() {
            trigger.guard.release();

            self.notifications.warning(&messages.coupon_required);

            return Activation::Failed(ActionError::Validation(messages.coupon_required.clone()));
        }

        self.render(trigger, TriggerState::Pending, &messages.applying_label);

        let body = RequestBody::Form(vec![(self.config.coupon_field.clone(), code)]);
        let endpoint = trigger.endpoint(&self.config.endpoints.apply_coupon);

        match self.send(trigger, endpoint, body).await {
            Ok(response) => {
                let message = response.message().unwrap_or(&messages.coupon_success);

                trigger.guard.release();

                self.projector.apply_coupon(&self.snapshot(&response), message);
                self.render(
                    trigger,
                    TriggerState::CouponApplied,
                    &messages.remove_coupon_label,
                );
                self.notifications.success(message);

                Activation::Applied
            }
            Err(error) => {
                let message = error.user_message(&messages.coupon_error, &messages.network_error);

                self.projector.coupon_failed(&message);
                self.restore(trigger);
                self.notifications.error(&message);

                Activation::Failed(error)
            }
        }
    }

    async fn remove_coupon(&self, trigger: &BoundTrigger) -> Activation {
        let messages = &self.config.messages;

        self.render(trigger, TriggerState::Pending, &messages.remove_coupon_label);

        let endpoint = &self.config.endpoints.remove_coupon;

        match self.send(trigger, endpoint, RequestBody::Empty).await {
            Ok(response) => {
                trigger.guard.lock();

                self.notifications
                    .success(response.message().unwrap_or(&messages.coupon_removed));
                self.projector
                    .reload_after(self.config.timings.clear_reload())
                    .await;

                Activation::Applied
            }
            Err(error) => {
                trigger.guard.release();
                self.render(
                    trigger,
                    TriggerState::CouponApplied,
                    &messages.remove_coupon_label,
                );

                self.fail(error, &messages.coupon_error)
            }
        }
    }

    fn checkout(&self, trigger: &BoundTrigger) -> Activation {
        let messages = &self.config.messages;

        if !self.page.terms_accepted() {
            trigger.guard.release();

            self.notifications.warning(&messages.terms_required);
            self.page.focus_terms();

            return Activation::Failed(ActionError::Validation(messages.terms_required.clone()));
        }

        trigger.guard.lock();
        self.render(trigger, TriggerState::Submitting, &messages.processing_label);

        Activation::Submit
    }
}
