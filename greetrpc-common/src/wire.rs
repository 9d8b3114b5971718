use crate::{GreetError, HelloReply, HelloRequest, Result};

/// Wire encoding for the greeting call.
///
/// `Binary` is the default framing: the request body is the raw UTF-8 name and
/// the reply body is the raw UTF-8 message. `Json` substitutes a JSON envelope
/// at the stub layer; both sides agree on the format via `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Binary,
    Json,
}

impl WireFormat {
    pub const fn content_type(&self) -> &'static str {
        match self {
            WireFormat::Binary => "application/octet-stream",
            WireFormat::Json => "application/json",
        }
    }

    /// Resolve a `Content-Type` header value to a wire format.
    /// Parameters after the media type (e.g. `; charset=utf-8`) are ignored.
    /// Returns `None` for media types no marshaller is registered for.
    pub fn from_content_type(value: &str) -> Option<WireFormat> {
        let media_type = value.split(';').next().unwrap_or("").trim();
        match media_type {
            "application/octet-stream" => Some(WireFormat::Binary),
            "application/json" => Some(WireFormat::Json),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<WireFormat> {
        match name {
            "binary" => Some(WireFormat::Binary),
            "json" => Some(WireFormat::Json),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            WireFormat::Binary => "binary",
            WireFormat::Json => "json",
        }
    }
}

pub fn encode_request(format: WireFormat, request: &HelloRequest) -> Result<Vec<u8>> {
    match format {
        WireFormat::Binary => Ok(request.name.as_bytes().to_vec()),
        WireFormat::Json => {
            serde_json::to_vec(request).map_err(|e| GreetError::WireFormat(e.to_string()))
        }
    }
}

pub fn decode_request(format: WireFormat, bytes: &[u8]) -> Result<HelloRequest> {
    match format {
        WireFormat::Binary => String::from_utf8(bytes.to_vec())
            .map(|name| HelloRequest { name })
            .map_err(|e| GreetError::WireFormat(e.to_string())),
        WireFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| GreetError::WireFormat(e.to_string()))
        }
    }
}

pub fn encode_reply(format: WireFormat, reply: &HelloReply) -> Result<Vec<u8>> {
    match format {
        WireFormat::Binary => Ok(reply.message.as_bytes().to_vec()),
        WireFormat::Json => {
            serde_json::to_vec(reply).map_err(|e| GreetError::WireFormat(e.to_string()))
        }
    }
}

pub fn decode_reply(format: WireFormat, bytes: &[u8]) -> Result<HelloReply> {
    match format {
        WireFormat::Binary => String::from_utf8(bytes.to_vec())
            .map(|message| HelloReply { message })
            .map_err(|e| GreetError::WireFormat(e.to_string())),
        WireFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| GreetError::WireFormat(e.to_string()))
        }
    }
}
