use crate::codec::{JsonCodec, DEFAULT_MAX_REPLY_SIZE};
use crate::connection::Connection;
use crate::error::{MixerError, Result};
use crate::port::{Port, Ports};
use crate::protocol::{Command, Reply};
use crate::types::{Balance, Direction, PortState, Volume};
use crate::watch::{VolumeListener, VolumeWatch};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default time allowed for dialing the server
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct TargetConfig {
    host: String,
    port: u16,
    connect_timeout: Duration,
    max_reply_size: usize,
    newline_terminator: bool,
}

/// A jamyxer server endpoint
///
/// A `Target` holds no connection. Every operation dials the server, performs
/// one request/reply exchange and closes the connection again, so a `Target`
/// can be cloned freely and shared between tasks.
///
/// # Example
///
/// ```no_run
/// use jamyx::{Direction, Target};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let target = Target::new("127.0.0.1", 8080);
///     let mut mic = target.port(Direction::Input, "mic1").await?;
///     mic.set_volume(0.5).await?;
///     println!("{} is now at {}", mic.name(), mic.volume());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Target {
    config: Arc<TargetConfig>,
}

impl Target {
    /// Create a target for the server at `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            config: Arc::new(TargetConfig {
                host: host.into(),
                port,
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
                max_reply_size: DEFAULT_MAX_REPLY_SIZE,
                newline_terminator: false,
            }),
        }
    }

    /// Set how long to wait when dialing the server
    ///
    /// This only bounds connection setup. Replies, including long-poll
    /// listens, are waited for indefinitely.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        Arc::make_mut(&mut self.config).connect_timeout = connect_timeout;
        self
    }

    /// Set the largest reply accepted before the exchange fails
    pub fn with_max_reply_size(mut self, max_reply_size: usize) -> Self {
        Arc::make_mut(&mut self.config).max_reply_size = max_reply_size;
        self
    }

    /// Terminate each request with a newline, for servers that read lines
    pub fn with_newline_terminator(mut self, enabled: bool) -> Self {
        Arc::make_mut(&mut self.config).newline_terminator = enabled;
        self
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port_number(&self) -> u16 {
        self.config.port
    }

    /// `host:port` string used for dialing
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    fn codec(&self) -> JsonCodec {
        JsonCodec::new(self.config.max_reply_size)
            .with_newline_terminator(self.config.newline_terminator)
    }

    async fn open(&self) -> Result<Connection> {
        Connection::open(&self.addr(), self.config.connect_timeout, self.codec()).await
    }

    // ========== Raw Exchange ==========

    /// Send a command and return the decoded, uninterpreted reply
    pub async fn send_command(&self, command: &Command) -> Result<Value> {
        self.open().await?.exchange(command).await
    }

    /// Send a command and classify the reply by the shape it expects
    pub async fn request(&self, command: &Command) -> Result<Reply> {
        let reply = self.send_command(command).await?;
        Reply::classify(command.expects(), reply)
    }

    /// Like [`request`](Self::request), but gives up when `cancel` fires
    pub async fn request_until_cancelled(
        &self,
        command: &Command,
        cancel: &CancellationToken,
    ) -> Result<Reply> {
        let connection = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MixerError::Cancelled),
            connection = self.open() => connection?,
        };
        let reply = connection.exchange_until_cancelled(command, cancel).await?;
        Reply::classify(command.expects(), reply)
    }

    async fn acknowledge(&self, command: &Command) -> Result<()> {
        self.request(command).await?;
        Ok(())
    }

    // ========== Volume ==========

    /// Set the volume of an input or output channel
    ///
    /// A NaN or infinite `volume` fails with
    /// [`MixerError::InvalidLevel`] before anything is sent.
    pub async fn volume_set(
        &self,
        direction: Direction,
        channel: &str,
        volume: Volume,
    ) -> Result<()> {
        let command = Command::set_volume(direction, channel, volume)?;
        self.acknowledge(&command).await
    }

    pub async fn volume_input_set(&self, input: &str, volume: Volume) -> Result<()> {
        self.volume_set(Direction::Input, input, volume).await
    }

    pub async fn volume_output_set(&self, output: &str, volume: Volume) -> Result<()> {
        self.volume_set(Direction::Output, output, volume).await
    }

    // ========== Balance ==========

    /// Set the balance of an input or output channel
    pub async fn balance_set(
        &self,
        direction: Direction,
        channel: &str,
        balance: Balance,
    ) -> Result<()> {
        let command = Command::set_balance(direction, channel, balance)?;
        self.acknowledge(&command).await
    }

    pub async fn balance_input_set(&self, input: &str, balance: Balance) -> Result<()> {
        self.balance_set(Direction::Input, input, balance).await
    }

    pub async fn balance_output_set(&self, output: &str, balance: Balance) -> Result<()> {
        self.balance_set(Direction::Output, output, balance).await
    }

    // ========== Ports ==========

    pub(crate) async fn port_state(
        &self,
        direction: Direction,
        channel: &str,
    ) -> Result<PortState> {
        self.request(&Command::get_port(direction, channel))
            .await?
            .into_port()
    }

    /// Fetch the current state of one input or output channel
    pub async fn port(&self, direction: Direction, channel: &str) -> Result<Port> {
        let state = self.port_state(direction, channel).await?;
        Ok(Port::new(self.clone(), state))
    }

    /// Fetch every input and output port in one request
    pub async fn ports(&self) -> Result<Ports> {
        let (inputs, outputs) = self.request(&Command::get_channels()).await?.into_channels()?;

        Ok(Ports {
            inputs: inputs
                .into_iter()
                .map(|state| Port::new(self.clone(), state))
                .collect(),
            outputs: outputs
                .into_iter()
                .map(|state| Port::new(self.clone(), state))
                .collect(),
        })
    }

    // ========== Connections ==========

    /// Connect an input to an output
    pub async fn connect_io(&self, input: &str, output: &str) -> Result<()> {
        self.acknowledge(&Command::connect(input, output)).await
    }

    /// Disconnect an input from an output
    pub async fn disconnect_io(&self, input: &str, output: &str) -> Result<()> {
        self.acknowledge(&Command::disconnect(input, output)).await
    }

    /// Toggle the connection between an input and an output
    pub async fn toggle_connection_io(&self, input: &str, output: &str) -> Result<()> {
        self.acknowledge(&Command::toggle(input, output)).await
    }

    /// Check whether `input` is connected to `output`
    ///
    /// Always reads the output port fresh from the server.
    pub async fn connected_io(&self, input: &str, output: &str) -> Result<bool> {
        let state = self.port_state(Direction::Output, output).await?;
        Ok(state.is_connected_to(input))
    }

    // ========== Monitor ==========

    /// Route a channel to the monitoring output
    pub async fn set_monitor(&self, direction: Direction, channel: &str) -> Result<()> {
        self.acknowledge(&Command::set_monitor(direction, channel)).await
    }

    /// Fetch the currently monitored port
    pub async fn monitor_port(&self) -> Result<Port> {
        let state = self.request(&Command::get_monitor()).await?.into_port()?;
        Ok(Port::new(self.clone(), state))
    }

    // ========== Listeners ==========

    /// Wait for the volume of a channel to change and return its new state
    ///
    /// The server holds the request until the volume changes, so this can
    /// wait forever. Use
    /// [`volume_listen_until_cancelled`](Self::volume_listen_until_cancelled)
    /// or [`spawn_volume_listener`](Self::spawn_volume_listener) to be able
    /// to give up.
    pub async fn volume_listen(&self, direction: Direction, channel: &str) -> Result<Port> {
        let state = self
            .request(&Command::listen_volume(direction, channel))
            .await?
            .into_port()?;
        Ok(Port::new(self.clone(), state))
    }

    pub async fn volume_input_listen(&self, input: &str) -> Result<Port> {
        self.volume_listen(Direction::Input, input).await
    }

    pub async fn volume_output_listen(&self, output: &str) -> Result<Port> {
        self.volume_listen(Direction::Output, output).await
    }

    /// Cancellable form of [`volume_listen`](Self::volume_listen)
    ///
    /// Returns [`MixerError::Cancelled`](crate::MixerError::Cancelled) once
    /// `cancel` fires; the connection is closed at that point.
    pub async fn volume_listen_until_cancelled(
        &self,
        direction: Direction,
        channel: &str,
        cancel: &CancellationToken,
    ) -> Result<Port> {
        let state = self
            .request_until_cancelled(&Command::listen_volume(direction, channel), cancel)
            .await?
            .into_port()?;
        Ok(Port::new(self.clone(), state))
    }

    /// Run one volume listen as a background task
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn_volume_listener(
        &self,
        direction: Direction,
        channel: impl Into<String>,
    ) -> VolumeListener {
        VolumeListener::spawn(self.clone(), direction, channel.into())
    }

    /// Watch the volume of several channels at once
    ///
    /// Each channel is listened to by its own task on its own connection;
    /// changes arrive through the returned [`VolumeWatch`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn watch_volumes<I, S>(&self, channels: I) -> VolumeWatch
    where
        I: IntoIterator<Item = (Direction, S)>,
        S: Into<String>,
    {
        VolumeWatch::spawn(
            self.clone(),
            channels
                .into_iter()
                .map(|(direction, channel)| (direction, channel.into()))
                .collect(),
        )
    }
}
