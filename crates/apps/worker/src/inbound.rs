use std::fmt;

use js_sys::{JSON, Reflect};
use protocol::{Command, DecodeError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::OffscreenCanvas;

/// A decoded host message. The render target travels as a transferable next
/// to the JSON fields and is picked off before decoding.
pub struct Inbound {
    pub command: Command,
    pub canvas: Option<OffscreenCanvas>,
}

#[derive(Debug)]
pub enum InboundError {
    /// `JSON.stringify` rejected the payload.
    Unserializable,
    Decode(DecodeError),
}

impl fmt::Display for InboundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundError::Unserializable => write!(f, "message is not serializable"),
            InboundError::Decode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for InboundError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InboundError::Decode(e) => Some(e),
            InboundError::Unserializable => None,
        }
    }
}

impl From<DecodeError> for InboundError {
    fn from(value: DecodeError) -> Self {
        InboundError::Decode(value)
    }
}

pub fn decode(data: &JsValue) -> Result<Inbound, InboundError> {
    let canvas = Reflect::get(data, &JsValue::from_str("canvas"))
        .ok()
        .and_then(|v| v.dyn_into::<OffscreenCanvas>().ok());

    // A canvas stringifies to `{}`, which the decoder ignores.
    let json = JSON::stringify(data)
        .ok()
        .and_then(|s| s.as_string())
        .ok_or(InboundError::Unserializable)?;

    Ok(Inbound {
        command: Command::decode(&json)?,
        canvas,
    })
}
