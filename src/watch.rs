use crate::error::{MixerError, Result};
use crate::port::Port;
use crate::target::Target;
use crate::types::Direction;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const WATCH_QUEUE_CAPACITY: usize = 64;

/// Event reported by a [`VolumeWatch`]
#[derive(Debug)]
pub enum VolumeEvent {
    /// The server reported a volume change; carries the fresh port state
    Changed(Port),

    /// Listening on a channel failed; that channel is no longer watched
    Failed {
        direction: Direction,
        channel: String,
        error: MixerError,
    },
}

/// Handle to a single background volume listen
///
/// Dropping the handle cancels the listen.
pub struct VolumeListener {
    cancel: CancellationToken,
    handle: Option<JoinHandle<Result<Port>>>,
}

impl VolumeListener {
    pub(crate) fn spawn(target: Target, direction: Direction, channel: String) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            target
                .volume_listen_until_cancelled(direction, &channel, &token)
                .await
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Ask the listen to stop; [`join`](Self::join) then yields
    /// [`MixerError::Cancelled`] unless the server already replied
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the listen to finish
    pub async fn join(mut self) -> Result<Port> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| MixerError::ChannelError("Listener already joined".to_string()))?;

        handle
            .await
            .map_err(|e| MixerError::ChannelError(format!("Listener task failed: {}", e)))?
    }
}

impl Drop for VolumeListener {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Receiver for volume changes on several channels
///
/// Each watched channel is served by its own task that repeatedly issues a
/// volume listen on a fresh connection. A task stops after its first error,
/// reporting it as [`VolumeEvent::Failed`]. Dropping the watch cancels all
/// tasks.
pub struct VolumeWatch {
    rx: mpsc::Receiver<VolumeEvent>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl VolumeWatch {
    pub(crate) fn spawn(target: Target, channels: Vec<(Direction, String)>) -> Self {
        let (tx, rx) = mpsc::channel(WATCH_QUEUE_CAPACITY);
        let cancel = CancellationToken::new();

        tracing::info!("Watching volume of {} channel(s) on {}", channels.len(), target.addr());

        let tasks = channels
            .into_iter()
            .map(|(direction, channel)| {
                tokio::spawn(watch_channel(
                    target.clone(),
                    direction,
                    channel,
                    tx.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        Self { rx, cancel, tasks }
    }

    /// Number of channels this watch was started with
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Receive the next event
    ///
    /// Fails once every channel task has ended.
    pub async fn recv(&mut self) -> Result<VolumeEvent> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| MixerError::ChannelError("Volume watch closed".to_string()))
    }

    /// Try to receive an event without blocking
    ///
    /// Returns `None` if no event is available.
    pub fn try_recv(&mut self) -> Result<Option<VolumeEvent>> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(MixerError::ChannelError("Volume watch closed".to_string()))
            }
        }
    }

    /// Cancel every listen and wait for the tasks to exit
    pub async fn stop(mut self) {
        self.cancel.cancel();
        self.rx.close();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!("Volume watch task failed: {}", e);
            }
        }
        tracing::info!("Volume watch stopped");
    }
}

impl Drop for VolumeWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn watch_channel(
    target: Target,
    direction: Direction,
    channel: String,
    tx: mpsc::Sender<VolumeEvent>,
    cancel: CancellationToken,
) {
    loop {
        match target
            .volume_listen_until_cancelled(direction, &channel, &cancel)
            .await
        {
            Ok(port) => {
                if tx.send(VolumeEvent::Changed(port)).await.is_err() {
                    break;
                }
            }
            Err(MixerError::Cancelled) => break,
            Err(error) => {
                tracing::warn!("Volume listen on {} {} failed: {}", direction, channel, error);
                let _ = tx
                    .send(VolumeEvent::Failed {
                        direction,
                        channel,
                        error,
                    })
                    .await;
                break;
            }
        }
    }
}
