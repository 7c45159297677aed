use crate::codec::{project_port, project_port_list, reply_object};
use crate::error::{MixerError, Result};
use crate::types::{Balance, Direction, PortState, Volume};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Namespace every mixer command is addressed to
pub const MIXER_NAMESPACE: &str = "myx";

/// Command request structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub target: String,
    pub cmd: Verb,
    pub opts: Vec<String>,
}

/// Command verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verb {
    #[serde(rename = "set")]
    Set,
    #[serde(rename = "get")]
    Get,
    #[serde(rename = "con")]
    Connect,
    #[serde(rename = "dis")]
    Disconnect,
    #[serde(rename = "tog")]
    Toggle,
    /// Long-poll: the server replies only once the watched value changes
    #[serde(rename = "mon")]
    Monitor,
}

/// Reply shape a command expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// `{"obj": <port>}`
    Port,
    /// `{"obj": {"inputs": [...], "outputs": [...]}}`
    Channels,
    /// Acknowledgement, not interpreted
    Ack,
}

/// Format a float the way the server expects (fixed notation, six decimals)
///
/// NaN and infinities have no fixed-notation form and are rejected.
pub fn format_level(value: f32) -> Result<String> {
    if !value.is_finite() {
        return Err(MixerError::InvalidLevel(value));
    }
    Ok(format!("{:.6}", value))
}

impl Command {
    /// Create a command in the mixer namespace
    pub fn new(cmd: Verb, opts: Vec<String>) -> Self {
        Self {
            target: MIXER_NAMESPACE.to_string(),
            cmd,
            opts,
        }
    }

    pub fn set_volume(direction: Direction, channel: &str, volume: Volume) -> Result<Self> {
        Ok(Self::new(
            Verb::Set,
            vec![
                "v".to_string(),
                direction.code().to_string(),
                channel.to_string(),
                format_level(volume)?,
            ],
        ))
    }

    pub fn set_balance(direction: Direction, channel: &str, balance: Balance) -> Result<Self> {
        Ok(Self::new(
            Verb::Set,
            vec![
                "b".to_string(),
                direction.code().to_string(),
                channel.to_string(),
                format_level(balance)?,
            ],
        ))
    }

    /// Mark a channel as the monitored port
    pub fn set_monitor(direction: Direction, channel: &str) -> Self {
        Self::new(
            Verb::Set,
            vec![
                "monitor".to_string(),
                direction.code().to_string(),
                channel.to_string(),
            ],
        )
    }

    pub fn get_port(direction: Direction, channel: &str) -> Self {
        Self::new(
            Verb::Get,
            vec![direction.code().to_string(), channel.to_string()],
        )
    }

    pub fn get_channels() -> Self {
        Self::new(Verb::Get, vec!["channels".to_string()])
    }

    pub fn get_monitor() -> Self {
        Self::new(Verb::Get, vec!["monitor".to_string()])
    }

    pub fn connect(input: &str, output: &str) -> Self {
        Self::new(Verb::Connect, vec![input.to_string(), output.to_string()])
    }

    pub fn disconnect(input: &str, output: &str) -> Self {
        Self::new(Verb::Disconnect, vec![input.to_string(), output.to_string()])
    }

    pub fn toggle(input: &str, output: &str) -> Self {
        Self::new(Verb::Toggle, vec![input.to_string(), output.to_string()])
    }

    /// Block server-side until the channel's volume changes
    pub fn listen_volume(direction: Direction, channel: &str) -> Self {
        Self::new(
            Verb::Monitor,
            vec![
                "vol".to_string(),
                direction.code().to_string(),
                channel.to_string(),
            ],
        )
    }

    /// Reply shape this command should produce
    pub fn expects(&self) -> ReplyKind {
        match self.cmd {
            Verb::Get if self.opts.len() == 1 && self.opts[0] == "channels" => ReplyKind::Channels,
            Verb::Get | Verb::Monitor => ReplyKind::Port,
            Verb::Set | Verb::Connect | Verb::Disconnect | Verb::Toggle => ReplyKind::Ack,
        }
    }

    /// Whether the server holds the reply until a state change
    pub fn is_long_poll(&self) -> bool {
        self.cmd == Verb::Monitor
    }
}

/// Typed reply
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Port(PortState),
    Channels {
        inputs: Vec<PortState>,
        outputs: Vec<PortState>,
    },
    Ack(Value),
}

impl Reply {
    /// Validate a decoded reply against the shape `kind` expects
    ///
    /// An object carrying a string `error` member is turned into
    /// [`MixerError::Server`] regardless of `kind`.
    pub fn classify(kind: ReplyKind, value: Value) -> Result<Self> {
        if let Some(detail) = value.get("error").and_then(|v| v.as_str()) {
            return Err(MixerError::Server {
                detail: detail.to_string(),
            });
        }

        match kind {
            ReplyKind::Port => Ok(Reply::Port(project_port(reply_object(&value)?)?)),
            ReplyKind::Channels => {
                let group = reply_object(&value)?;
                Ok(Reply::Channels {
                    inputs: project_port_list(group, "inputs")?,
                    outputs: project_port_list(group, "outputs")?,
                })
            }
            ReplyKind::Ack => Ok(Reply::Ack(value)),
        }
    }

    pub fn into_port(self) -> Result<PortState> {
        match self {
            Reply::Port(state) => Ok(state),
            other => Err(MixerError::InvalidResponse(format!(
                "Expected port reply, got {:?}",
                other
            ))),
        }
    }

    pub fn into_channels(self) -> Result<(Vec<PortState>, Vec<PortState>)> {
        match self {
            Reply::Channels { inputs, outputs } => Ok((inputs, outputs)),
            other => Err(MixerError::InvalidResponse(format!(
                "Expected channels reply, got {:?}",
                other
            ))),
        }
    }
}
