use tokio::sync::watch;

/// Receiving half of the shutdown broadcast.
///
/// Workers hold a receiver and treat a change notification as the request to
/// stop after the current operation.
pub type ShutdownRx = watch::Receiver<()>;

/// Sending half of the shutdown broadcast.
///
/// Cloneable so multiple components can coordinate graceful termination.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<()>);

impl ShutdownTx {
    /// Signals shutdown to all subscribers.
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }

    /// Creates a new receiver subscribed to this sender.
    pub fn subscribe(&self) -> ShutdownRx {
        self.0.subscribe()
    }
}

/// Creates a connected shutdown channel pair.
///
/// The channel carries unit values only; subscribers react to the
/// notification, not to a payload.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(());
    (ShutdownTx(tx), rx)
}
