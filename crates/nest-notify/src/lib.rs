//! Change notification for NestDB resources.
//!
//! Every resource node owns a [`SubscriberSet`] of weak listener handles.
//! The tree calls [`SubscriptionHub::notify`] after each successful write;
//! the hub stamps a [`ResourceEvent`] and pushes it to every listener that
//! is still alive. Delivery is fire-and-forget: a failing listener is
//! logged and skipped, never reported back to the writer.
//!
//! The transport (for example an SSE stream) owns its listener through an
//! `Arc`; dropping it is all it takes to unsubscribe.

pub mod error;
pub mod event;
pub mod hub;

pub use error::NotifyError;
pub use event::{EventKind, ResourceEvent};
pub use hub::{ChannelListener, EventListener, SubscriberSet, SubscriptionHub};
