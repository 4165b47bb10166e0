//! Cartsync prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    client::CartSyncClient,
    config::{ClientConfig, ConfigError, Endpoints, Messages, Timings},
    confirm::{Confirm, StaticConfirm},
    dispatcher::{Activation, ActionDispatcher, CartAction},
    executor::{ActionError, ActionResult, ErrorKind, RequestExecutor},
    guard::{GuardState, PendingActionGuard},
    items::{CartItemRef, DataAttributes, ItemType, ResolveError},
    notify::{Notification, NotificationSink, NotificationStack, Notifier, Severity},
    page::{
        AmountField, MemoryPage, MemoryPageBuilder, Page, TriggerBinding, TriggerId, TriggerKind,
        TriggerState, TriggerView,
    },
    projector::StateProjector,
    snapshot::{CartSnapshot, CartTotals, SnapshotError},
    transport::{
        ApiRequest, ApiResponse, HttpTransport, HttpTransportError, Method, RequestBody,
        Transport, TransportError,
    },
    wire::{CartResponse, ItemRequest},
};
