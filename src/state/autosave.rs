//! Debounced autosave.
//!
//! An [`Autosaver`] owns a background task that writes project snapshots
//! through a [`PersistenceGateway`]. Every scheduled snapshot replaces the
//! pending one and restarts the quiet period, so a burst of edits produces
//! a single write of the latest state once the burst settles.
//!
//! Failed writes are logged and dropped. The next scheduled change tries
//! again with a fresh snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{Result, SpliceError};
use crate::model::ProjectSnapshot;
use crate::state::gateway::PersistenceGateway;

#[derive(Debug)]
enum Command {
    Schedule(Box<ProjectSnapshot>),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Cheap, cloneable sender side of an [`Autosaver`].
#[derive(Debug, Clone)]
pub struct AutosaveHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl AutosaveHandle {
    /// Queue `snapshot` for saving after the quiet period.
    pub fn schedule(&self, snapshot: ProjectSnapshot) -> Result<()> {
        self.tx
            .send(Command::Schedule(Box::new(snapshot)))
            .map_err(|_| SpliceError::AutosaveClosed)
    }

    /// Write any pending snapshot now and wait for the write to finish.
    pub async fn flush(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(Command::Flush(done))
            .map_err(|_| SpliceError::AutosaveClosed)?;
        wait.await.map_err(|_| SpliceError::AutosaveClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Background debounce task writing snapshots through a gateway.
#[derive(Debug)]
pub struct Autosaver {
    handle: AutosaveHandle,
    task: JoinHandle<()>,
    delay: Duration,
}

impl Autosaver {
    /// Start the autosave task. Must be called inside a tokio runtime.
    pub fn spawn(gateway: Arc<dyn PersistenceGateway>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(gateway, delay, rx));
        debug!(delay_ms = delay.as_millis() as u64, "Autosave task started");
        Self {
            handle: AutosaveHandle { tx },
            task,
            delay,
        }
    }

    pub fn handle(&self) -> AutosaveHandle {
        self.handle.clone()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&self, snapshot: ProjectSnapshot) -> Result<()> {
        self.handle.schedule(snapshot)
    }

    pub async fn flush(&self) -> Result<()> {
        self.handle.flush().await
    }

    /// Write any pending snapshot, then stop the task.
    pub async fn shutdown(self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        if self.handle.tx.send(Command::Shutdown(done)).is_ok() {
            let _ = wait.await;
        }
        self.task.await.map_err(|e| SpliceError::PersistenceUnavailable {
            reason: format!("autosave task failed: {e}"),
        })
    }
}

async fn run(
    gateway: Arc<dyn PersistenceGateway>,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: Option<Box<ProjectSnapshot>> = None;
    let timer = sleep(delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Schedule(snapshot)) => {
                    pending = Some(snapshot);
                    timer.as_mut().reset(Instant::now() + delay);
                }
                Some(Command::Flush(done)) => {
                    if let Some(snapshot) = pending.take() {
                        write(gateway.as_ref(), &snapshot).await;
                    }
                    let _ = done.send(());
                }
                Some(Command::Shutdown(done)) => {
                    if let Some(snapshot) = pending.take() {
                        write(gateway.as_ref(), &snapshot).await;
                    }
                    let _ = done.send(());
                    break;
                }
                None => {
                    if let Some(snapshot) = pending.take() {
                        write(gateway.as_ref(), &snapshot).await;
                    }
                    break;
                }
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(snapshot) = pending.take() {
                    write(gateway.as_ref(), &snapshot).await;
                }
            }
        }
    }

    debug!("Autosave task stopped");
}

async fn write(gateway: &dyn PersistenceGateway, snapshot: &ProjectSnapshot) {
    match gateway.save(snapshot).await {
        Ok(()) => debug!(
            name = %snapshot.document.project_settings.name,
            "Autosaved project"
        ),
        Err(e) => warn!(
            code = e.error_code(),
            error = %e,
            "Autosave failed; waiting for the next change"
        ),
    }
}
