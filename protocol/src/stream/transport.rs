//! The event-stream transport seam.

use std::sync::Arc;

use async_trait::async_trait;

use super::registry::{Listener, ListenerId};
use crate::rpc::TransportError;

/// A bidirectional text stream with registrable frame listeners.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Writes one text frame.
    async fn send(&self, text: String) -> Result<(), TransportError>;

    /// Registers a listener for every subsequent inbound frame.
    fn add_listener(&self, listener: Listener) -> ListenerId;

    /// Unregisters a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

#[async_trait]
impl<T: StreamTransport + ?Sized> StreamTransport for Arc<T> {
    async fn send(&self, text: String) -> Result<(), TransportError> {
        (**self).send(text).await
    }

    fn add_listener(&self, listener: Listener) -> ListenerId {
        (**self).add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        (**self).remove_listener(id)
    }
}
