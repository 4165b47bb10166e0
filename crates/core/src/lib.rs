//! Cartsync
//!
//! Client-side cart and coupon synchronisation for a server-rendered storefront. Page triggers
//! (add, remove, clear, apply coupon, checkout) are bound to background requests, and every
//! server response is projected back onto the page so badges, totals and the item list match
//! the server's cart.

pub mod client;
pub mod config;
pub mod confirm;
pub mod dispatcher;
pub mod executor;
pub mod forms;
pub mod guard;
pub mod items;
pub mod notify;
pub mod page;
pub mod projector;
pub mod snapshot;
pub mod transport;
pub mod wire;

pub mod prelude;
