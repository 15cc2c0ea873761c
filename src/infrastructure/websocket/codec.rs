//! Wire format of the token feed

use serde::{Deserialize, Serialize};
use crate::shared::errors::FrameError;
use crate::shared::types::TokenUpdateMessage;

/// Markers of acknowledgement/keepalive frames that carry no token payload
const CONTROL_MARKERS: [&str; 2] = ["success", "Ping"];

/// A decoded inbound text frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Control,
    Token(TokenUpdateMessage),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: TokenUpdateMessage,
}

/// Outbound subscription request sent once the socket opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub channel: String,
    pub token: String,
}

pub fn is_control(raw: &str) -> bool {
    CONTROL_MARKERS.iter().any(|marker| raw.contains(marker))
}

/// Control strings are recognised before any JSON parsing happens
pub fn decode_frame(raw: &str) -> Result<InboundFrame, FrameError> {
    if is_control(raw) {
        return Ok(InboundFrame::Control);
    }
    let envelope: Envelope = serde_json::from_str(raw)?;
    Ok(InboundFrame::Token(envelope.data))
}

/// Handshake payload: a JSON array holding a single subscription
pub fn encode_subscription(subscription: &Subscription) -> Result<String, serde_json::Error> {
    serde_json::to_string(&[subscription])
}
