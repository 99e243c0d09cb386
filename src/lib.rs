/// x11client - An asynchronous X11 protocol client engine
///
/// This library speaks the X11 wire protocol over a local UNIX socket:
/// connection setup, request encoding, reply and error correlation, extension
/// negotiation and event demultiplexing. It never blocks on a reply; results
/// arrive through callbacks as the embedding loop feeds input in.

pub mod client;
pub mod connection;
pub mod extensions;
pub mod protocol;
pub mod resources;

pub use client::{Client, ConnectionState, Cookie, EventCallbacks, RequestState};
pub use connection::{DisplayName, MemoryTransport, Transport};
pub use protocol::{Atom, ClientError, Drawable, Event, GContext, Pixmap, Window, X11Error, X11Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version
pub const PROTOCOL_MAJOR: u16 = protocol::PROTOCOL_MAJOR_VERSION;
pub const PROTOCOL_MINOR: u16 = protocol::PROTOCOL_MINOR_VERSION;
