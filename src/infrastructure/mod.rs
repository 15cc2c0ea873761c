//! Infrastructure layer - external transports

pub mod websocket;
