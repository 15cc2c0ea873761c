//! Websocket transport for the live token feed

mod codec;
mod connection;

pub use codec::{decode_frame, encode_subscription, is_control, InboundFrame, Subscription};
pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
