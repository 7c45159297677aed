//! Wire codec and reply projection.
//!
//! Requests are written as a single JSON object. Replies carry no length
//! prefix or delimiter, so the decoder accumulates bytes until they parse as
//! one complete JSON value.

use crate::error::{MixerError, Result};
use crate::protocol::Command;
use crate::types::{Direction, PortState};
use bytes::{Buf, BufMut, BytesMut};
use serde_json::{Map, Value};
use tokio_util::codec::{Decoder, Encoder};

/// Default upper bound on the size of a single reply
pub const DEFAULT_MAX_REPLY_SIZE: usize = 1024 * 1024;

/// Codec for the jamyxer JSON command protocol
#[derive(Debug, Clone)]
pub struct JsonCodec {
    max_reply_size: usize,
    newline_terminator: bool,
}

impl JsonCodec {
    /// Create a codec that rejects replies larger than `max_reply_size` bytes
    pub fn new(max_reply_size: usize) -> Self {
        Self {
            max_reply_size,
            newline_terminator: false,
        }
    }

    /// Terminate every encoded request with `\n`
    pub fn with_newline_terminator(mut self, enabled: bool) -> Self {
        self.newline_terminator = enabled;
        self
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REPLY_SIZE)
    }
}

impl<'a> Encoder<&'a Command> for JsonCodec {
    type Error = MixerError;

    fn encode(&mut self, command: &'a Command, dst: &mut BytesMut) -> Result<()> {
        let json = serde_json::to_vec(command)?;
        dst.reserve(json.len() + 1);
        dst.extend_from_slice(&json);
        if self.newline_terminator {
            dst.put_u8(b'\n');
        }
        Ok(())
    }
}

impl JsonCodec {
    /// Decode one value from the front of `src`
    ///
    /// Numbers and literals carry no closing delimiter, so one that runs up to
    /// the end of the buffer is only complete once the peer has closed.
    fn decode_value(&self, src: &mut BytesMut, at_eof: bool) -> Result<Option<Value>> {
        let Some(start) = src.iter().position(|b| !b.is_ascii_whitespace()) else {
            src.clear();
            return Ok(None);
        };
        src.advance(start);

        let (next, consumed) = {
            let mut stream = serde_json::Deserializer::from_slice(&src[..]).into_iter::<Value>();
            let next = stream.next();
            (next, stream.byte_offset())
        };

        match next {
            Some(Ok(value)) => {
                if consumed > self.max_reply_size {
                    return Err(MixerError::ReplyTooLarge(self.max_reply_size));
                }
                let delimited = value.is_object() || value.is_array() || value.is_string();
                if !delimited && consumed == src.len() && !at_eof {
                    return Ok(None);
                }
                src.advance(consumed);
                Ok(Some(value))
            }
            // Incomplete value: wait for more bytes
            Some(Err(e)) if e.is_eof() => {
                if src.len() > self.max_reply_size {
                    return Err(MixerError::ReplyTooLarge(self.max_reply_size));
                }
                Ok(None)
            }
            Some(Err(e)) => Err(MixerError::Json(e)),
            None => Ok(None),
        }
    }
}

impl Decoder for JsonCodec {
    type Item = Value;
    type Error = MixerError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Value>> {
        self.decode_value(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Value>> {
        match self.decode_value(src, true)? {
            Some(value) => Ok(Some(value)),
            None if src.is_empty() => Ok(None),
            None => Err(MixerError::ConnectionClosed),
        }
    }
}

/// Extract the `obj` member of a `get`/`mon` reply
pub fn reply_object(reply: &Value) -> Result<&Value> {
    let obj = reply
        .as_object()
        .ok_or_else(|| MixerError::InvalidResponse("Reply is not an object".to_string()))?;
    let inner = obj.get("obj").ok_or(MixerError::MissingField("obj"))?;
    if !inner.is_object() {
        return Err(MixerError::InvalidField {
            field: "obj",
            expected: "an object",
        });
    }
    Ok(inner)
}

/// Project a port object into a [`PortState`]
///
/// Every field is required with its exact JSON type. Null entries in `cons`
/// become empty strings so positions line up with the server's list.
pub fn project_port(value: &Value) -> Result<PortState> {
    let obj = value
        .as_object()
        .ok_or_else(|| MixerError::InvalidResponse("Port entry is not an object".to_string()))?;

    let name = string_field(obj, "port")?.to_string();

    let direction = Direction::from_ptype(string_field(obj, "ptype")?).ok_or(
        MixerError::InvalidField {
            field: "ptype",
            expected: "\"in\" or \"out\"",
        },
    )?;

    let mono = field(obj, "ismono")?
        .as_bool()
        .ok_or(MixerError::InvalidField {
            field: "ismono",
            expected: "a boolean",
        })?;

    let volume = number_field(obj, "vol")? as f32;
    let balance = number_field(obj, "bal")? as f32;

    let connections = field(obj, "cons")?
        .as_array()
        .ok_or(MixerError::InvalidField {
            field: "cons",
            expected: "an array",
        })?
        .iter()
        .map(|entry| match entry {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            _ => Err(MixerError::InvalidField {
                field: "cons",
                expected: "an array of strings",
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PortState {
        name,
        direction,
        mono,
        volume,
        balance,
        connections,
    })
}

/// Project the array stored under `key` of a channels group
pub fn project_port_list(group: &Value, key: &'static str) -> Result<Vec<PortState>> {
    let obj = group
        .as_object()
        .ok_or_else(|| MixerError::InvalidResponse("Channels group is not an object".to_string()))?;

    field(obj, key)?
        .as_array()
        .ok_or(MixerError::InvalidField {
            field: key,
            expected: "an array",
        })?
        .iter()
        .map(project_port)
        .collect()
}

fn field<'a>(obj: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value> {
    obj.get(key).ok_or(MixerError::MissingField(key))
}

fn string_field<'a>(obj: &'a Map<String, Value>, key: &'static str) -> Result<&'a str> {
    field(obj, key)?.as_str().ok_or(MixerError::InvalidField {
        field: key,
        expected: "a string",
    })
}

fn number_field(obj: &Map<String, Value>, key: &'static str) -> Result<f64> {
    field(obj, key)?.as_f64().ok_or(MixerError::InvalidField {
        field: key,
        expected: "a number",
    })
}
