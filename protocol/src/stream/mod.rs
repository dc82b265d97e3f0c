//! # Event Stream
//!
//! The push side of the node API. Frames arrive as JSON text and are fanned
//! out through a [`ListenerRegistry`]; the subscription protocol in
//! [`crate::rtc`] registers a filter there and waits for its match.
//!
//! ```text
//! registry.rs  - listener registry with snapshot dispatch
//! transport.rs - StreamTransport trait (send, add/remove listener)
//! socket.rs    - EmSocket, the tokio-tungstenite implementation
//! ```

pub mod registry;
pub mod socket;
pub mod transport;

pub use registry::{Listener, ListenerId, ListenerRegistry};
pub use socket::{EmSocket, SocketEvent};
pub use transport::StreamTransport;
