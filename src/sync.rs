use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::models::Task;
use crate::remote::RemoteStore;

const ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// One outbound mutation per optimistic local write. `Delete` carries the
/// full entity so a failed delete can be restored locally.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncCommand {
    Create { id: u64, description: String },
    SetCompleted { id: u64, completed: bool },
    Delete { task: Task },
}

/// Terminal failure report for a command the worker gave up on.
#[derive(Debug)]
pub struct SyncFailure {
    pub command: SyncCommand,
    pub error: anyhow::Error,
}

pub struct SyncHandle {
    pub commands: UnboundedSender<SyncCommand>,
    pub failures: UnboundedReceiver<SyncFailure>,
}

/// Spawns the worker that drains outbound commands one at a time, so remote
/// calls arrive in local issuance order. Must be called from within a tokio
/// runtime.
pub fn spawn(store: RemoteStore) -> SyncHandle {
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<SyncCommand>();
    let (failure_tx, failure_rx) = mpsc::unbounded_channel::<SyncFailure>();

    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            if let Err(error) = push_with_retry(&store, &command).await {
                log::warn!("giving up on {:?}: {:#}", command, error);
                // receiver gone means the session is shutting down
                let _ = failure_tx.send(SyncFailure { command, error });
            }
        }
    });

    SyncHandle {
        commands: command_tx,
        failures: failure_rx,
    }
}

async fn push_with_retry(store: &RemoteStore, command: &SyncCommand) -> Result<()> {
    let mut attempt = 1;
    loop {
        match push(store, command).await {
            Ok(()) => return Ok(()),
            Err(error) if attempt < ATTEMPTS => {
                log::debug!("sync attempt {} failed, retrying: {:#}", attempt, error);
                attempt += 1;
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(error) => return Err(error),
        }
    }
}

async fn push(store: &RemoteStore, command: &SyncCommand) -> Result<()> {
    match command {
        SyncCommand::Create { description, .. } => store.create_task(description).await,
        SyncCommand::SetCompleted { id, completed } => store.set_completed(*id, *completed).await,
        SyncCommand::Delete { task } => store.delete_task(task.id).await,
    }
}
