use serde::Serialize;
use std::fmt;

/// Channel name as known to the mixer
pub type ChannelName = String;

/// Volume level (server scale, typically 0.0 to 1.0)
pub type Volume = f32;

/// Stereo balance (server scale, typically -1.0 to 1.0)
pub type Balance = f32;

/// Which side of the mixer a port sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// One-character code used in command options
    pub fn code(self) -> &'static str {
        match self {
            Direction::Input => "i",
            Direction::Output => "o",
        }
    }

    /// Port type as reported in replies (`ptype`)
    pub fn ptype(self) -> &'static str {
        match self {
            Direction::Input => "in",
            Direction::Output => "out",
        }
    }

    /// Parse a `ptype` value
    pub fn from_ptype(ptype: &str) -> Option<Self> {
        match ptype {
            "in" => Some(Direction::Input),
            "out" => Some(Direction::Output),
            _ => None,
        }
    }

    pub fn is_input(self) -> bool {
        self == Direction::Input
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ptype())
    }
}

/// Port state as last read from the server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortState {
    /// Port (channel) name
    pub name: ChannelName,

    pub direction: Direction,

    /// Whether the port is mono rather than stereo
    pub mono: bool,

    pub volume: Volume,

    pub balance: Balance,

    /// Names of the channels this port is connected to, in server order.
    /// Null entries from the server appear as empty strings.
    pub connections: Vec<ChannelName>,
}

impl PortState {
    /// Check whether `channel` appears among the connections
    pub fn is_connected_to(&self, channel: &str) -> bool {
        self.connections.iter().any(|c| c == channel)
    }
}
