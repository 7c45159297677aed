//! Rust client library for controlling a jamyxer audio mixer
//!
//! The mixer is driven over a small JSON command protocol. This library
//! provides an async API for:
//!
//! - Reading input and output ports (volume, balance, mono flag, routing)
//! - Setting volume and balance
//! - Connecting, disconnecting and toggling input/output routes
//! - Selecting the monitored port
//! - Long-poll volume listeners, with cancellation and multi-channel watches
//!
//! # Quick Start
//!
//! ```no_run
//! use jamyx::{Direction, Target};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let target = Target::new("127.0.0.1", 8080);
//!
//!     let ports = target.ports().await?;
//!     for port in &ports.inputs {
//!         println!("{}: vol {} -> {:?}", port.name(), port.volume(), port.connections());
//!     }
//!
//!     let mut mic = target.port(Direction::Input, "mic1").await?;
//!     mic.set_volume(0.8).await?;
//!     mic.connect_to_channel("master").await?;
//!     assert!(mic.is_connected_to_channel("master"));
//!     Ok(())
//! }
//! ```
//!
//! # Listening for changes
//!
//! ```no_run
//! use jamyx::{Direction, Target, VolumeEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let target = Target::new("127.0.0.1", 8080);
//!     let mut watch = target.watch_volumes([
//!         (Direction::Input, "mic1"),
//!         (Direction::Output, "master"),
//!     ]);
//!
//!     while let Ok(event) = watch.recv().await {
//!         if let VolumeEvent::Changed(port) = event {
//!             println!("{} volume is now {}", port.name(), port.volume());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Target**: server endpoint and every mixer operation
//! - **Port**: typed port state with mutate-then-refresh operations
//! - **Watch**: background volume listeners
//! - **Protocol**: command vocabulary and reply classification
//! - **Codec**: JSON framing and reply projection
//! - **Connection**: one request/reply exchange over TCP

mod codec;
mod connection;
mod error;
mod port;
mod protocol;
mod target;
mod types;
mod watch;

// Public exports
pub use codec::{JsonCodec, DEFAULT_MAX_REPLY_SIZE};
pub use error::{MixerError, Result};
pub use port::{Port, Ports};
pub use protocol::{format_level, Command, Reply, ReplyKind, Verb, MIXER_NAMESPACE};
pub use target::{Target, DEFAULT_CONNECT_TIMEOUT};
pub use types::{Balance, ChannelName, Direction, PortState, Volume};
pub use watch::{VolumeEvent, VolumeListener, VolumeWatch};
