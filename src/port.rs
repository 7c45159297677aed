use crate::error::Result;
use crate::target::Target;
use crate::types::{Balance, Direction, PortState, Volume};
use tokio_util::sync::CancellationToken;

/// A mixer input or output port
///
/// A `Port` holds the state read from the server on its last fetch; it is
/// not kept in sync. Operations that change the port on the server re-read it
/// afterwards, except disconnect and toggle, which leave the local
/// connection list as it was until [`update`](Port::update) is called.
#[derive(Debug, Clone)]
pub struct Port {
    target: Target,
    state: PortState,
}

/// Snapshot of every port on the mixer
#[derive(Debug, Clone, Default)]
pub struct Ports {
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
}

impl Ports {
    /// Find an input port by name
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name() == name)
    }

    /// Find an output port by name
    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name() == name)
    }
}

impl Port {
    pub(crate) fn new(target: Target, state: PortState) -> Self {
        Self { target, state }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    pub fn is_input(&self) -> bool {
        self.state.direction.is_input()
    }

    pub fn is_mono(&self) -> bool {
        self.state.mono
    }

    pub fn volume(&self) -> Volume {
        self.state.volume
    }

    pub fn balance(&self) -> Balance {
        self.state.balance
    }

    /// Connected channel names as of the last read
    pub fn connections(&self) -> &[String] {
        &self.state.connections
    }

    /// Snapshot of the port's last known state
    pub fn state(&self) -> &PortState {
        &self.state
    }

    pub fn into_state(self) -> PortState {
        self.state
    }

    /// Target this port issues its commands to
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Order `(self, channel)` as `(input, output)`
    fn io_pair<'a>(&'a self, channel: &'a str) -> (&'a str, &'a str) {
        if self.is_input() {
            (self.name(), channel)
        } else {
            (channel, self.name())
        }
    }

    // ========== Refresh ==========

    /// Re-read the port from the server and overwrite every field
    pub async fn update(&mut self) -> Result<()> {
        self.state = self
            .target
            .port_state(self.state.direction, &self.state.name)
            .await?;
        Ok(())
    }

    // ========== Levels ==========

    /// Set the port's volume, then refresh
    pub async fn set_volume(&mut self, volume: Volume) -> Result<()> {
        self.target
            .volume_set(self.direction(), self.name(), volume)
            .await?;
        self.update().await
    }

    /// Set the port's balance, then refresh
    pub async fn set_balance(&mut self, balance: Balance) -> Result<()> {
        self.target
            .balance_set(self.direction(), self.name(), balance)
            .await?;
        self.update().await
    }

    /// Make this the monitored port, then refresh
    pub async fn set_monitored(&mut self) -> Result<()> {
        self.target.set_monitor(self.direction(), self.name()).await?;
        self.update().await
    }

    // ========== Listening ==========

    /// Wait for the volume to change and take on the state the server reports
    ///
    /// Blocks until the server replies; see
    /// [`listen_volume_until_cancelled`](Port::listen_volume_until_cancelled).
    pub async fn listen_volume(&mut self) -> Result<()> {
        let port = self
            .target
            .volume_listen(self.direction(), self.name())
            .await?;
        self.state = port.state;
        Ok(())
    }

    /// Like [`listen_volume`](Port::listen_volume), but gives up when `cancel`
    /// fires. The port is left untouched on cancellation.
    pub async fn listen_volume_until_cancelled(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let port = self
            .target
            .volume_listen_until_cancelled(self.direction(), self.name(), cancel)
            .await?;
        self.state = port.state;
        Ok(())
    }

    // ========== Connections ==========

    /// Whether `channel` was connected as of the last read
    pub fn is_connected_to_channel(&self, channel: &str) -> bool {
        self.state.is_connected_to(channel)
    }

    pub fn is_connected_to_port(&self, other: &Port) -> bool {
        self.is_connected_to_channel(other.name())
    }

    /// Connect to a channel on the other side of the mixer, then refresh
    pub async fn connect_to_channel(&mut self, channel: &str) -> Result<()> {
        let (input, output) = self.io_pair(channel);
        self.target.connect_io(input, output).await?;
        self.update().await
    }

    /// Connect to `other`, then refresh both ports
    pub async fn connect_to_port(&mut self, other: &mut Port) -> Result<()> {
        self.connect_to_channel(other.name()).await?;
        other.update().await
    }

    /// Disconnect from a channel
    ///
    /// The local connection list is not refreshed.
    pub async fn disconnect_from_channel(&self, channel: &str) -> Result<()> {
        let (input, output) = self.io_pair(channel);
        self.target.disconnect_io(input, output).await
    }

    pub async fn disconnect_from_port(&self, other: &Port) -> Result<()> {
        self.disconnect_from_channel(other.name()).await
    }

    /// Toggle the connection with a channel
    ///
    /// The local connection list is not refreshed.
    pub async fn toggle_connection_with_channel(&self, channel: &str) -> Result<()> {
        let (input, output) = self.io_pair(channel);
        self.target.toggle_connection_io(input, output).await
    }

    pub async fn toggle_connection_with_port(&self, other: &Port) -> Result<()> {
        self.toggle_connection_with_channel(other.name()).await
    }
}
