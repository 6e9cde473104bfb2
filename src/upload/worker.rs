use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::store::{ObjectStore, StoreError};

/// Upload retry policy and key layout.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Attempt ceiling across transient failures
    pub max_attempts: u32,
    /// First backoff delay; doubles per retry
    pub initial_backoff: Duration,
    /// Backoff cap
    pub max_backoff: Duration,
    /// Destination key prefix (objects land at `{prefix}/{file_name}`)
    pub key_prefix: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            key_prefix: "videos".to_string(),
        }
    }
}

/// A finalized clip waiting for remote durability.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub session_id: Uuid,
    pub source_path: PathBuf,
    pub attempt: u32,
}

impl UploadTask {
    pub fn new(session_id: Uuid, source_path: PathBuf) -> Self {
        Self {
            session_id,
            source_path,
            attempt: 0,
        }
    }

    fn destination_key(&self, prefix: &str) -> String {
        let name = self
            .source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.session_id.to_string());
        if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        }
    }
}

/// Terminal upload failures reported to the caller.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload failed permanently: {0}")]
    Permanent(String),

    #[error("retry budget exhausted after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: String },
}

/// Terminal result for one task. The worker never touches the local file;
/// deleting it is the caller's decision, made after it records success.
#[derive(Debug)]
pub struct UploadOutcome {
    pub session_id: Uuid,
    pub source_path: PathBuf,
    /// `Ok` carries the destination key
    pub result: Result<String, UploadError>,
}

/// Submit handle for the worker. Fire-and-forget; a resubmit for a session
/// already in flight is dropped.
#[derive(Clone)]
pub struct UploadHandle {
    tx: mpsc::Sender<UploadTask>,
}

impl UploadHandle {
    pub async fn submit(&self, task: UploadTask) -> anyhow::Result<()> {
        self.tx
            .send(task)
            .await
            .map_err(|_| anyhow::anyhow!("upload worker is gone"))
    }
}

/// Background upload worker.
///
/// One job per distinct file at a time (keyed by session id); independent
/// files upload concurrently on their own spawned jobs.
pub struct UploadWorker;

impl UploadWorker {
    /// Spawn the worker. Returns the submit handle and the outcome channel.
    pub fn spawn(
        store: Arc<dyn ObjectStore>,
        config: UploadConfig,
    ) -> (UploadHandle, mpsc::Receiver<UploadOutcome>) {
        let (task_tx, mut task_rx) = mpsc::channel::<UploadTask>(16);
        let (outcome_tx, outcome_rx) = mpsc::channel::<UploadOutcome>(16);

        tokio::spawn(async move {
            let in_flight: Arc<Mutex<HashSet<Uuid>>> = Arc::new(Mutex::new(HashSet::new()));

            while let Some(task) = task_rx.recv().await {
                {
                    let mut guard = in_flight.lock().await;
                    if !guard.insert(task.session_id) {
                        warn!(
                            "Upload for session {} already in flight; ignoring resubmit",
                            task.session_id
                        );
                        continue;
                    }
                }

                let store = Arc::clone(&store);
                let config = config.clone();
                let outcome_tx = outcome_tx.clone();
                let in_flight = Arc::clone(&in_flight);

                tokio::spawn(async move {
                    let session_id = task.session_id;
                    let source_path = task.source_path.clone();

                    let result = run_upload(store.as_ref(), &config, task).await;

                    in_flight.lock().await.remove(&session_id);

                    let outcome = UploadOutcome {
                        session_id,
                        source_path,
                        result,
                    };
                    if outcome_tx.send(outcome).await.is_err() {
                        warn!("Upload outcome for session {} had no receiver", session_id);
                    }
                });
            }

            info!("Upload worker stopped");
        });

        (UploadHandle { tx: task_tx }, outcome_rx)
    }
}

async fn run_upload(
    store: &dyn ObjectStore,
    config: &UploadConfig,
    mut task: UploadTask,
) -> Result<String, UploadError> {
    let key = task.destination_key(&config.key_prefix);
    let mut backoff = config.initial_backoff;

    loop {
        task.attempt += 1;
        info!(
            "Uploading {:?} as {} (attempt {}/{})",
            task.source_path, key, task.attempt, config.max_attempts
        );

        match store.put(&task.source_path, &key).await {
            Ok(()) => {
                info!("Upload succeeded: {}", key);
                return Ok(key);
            }
            Err(StoreError::Permanent(reason)) => {
                error!("Permanent upload failure for {}: {}", key, reason);
                return Err(UploadError::Permanent(reason));
            }
            Err(StoreError::Transient(reason)) => {
                if task.attempt >= config.max_attempts {
                    error!(
                        "Upload retry budget exhausted for {} after {} attempts: {}",
                        key, task.attempt, reason
                    );
                    return Err(UploadError::RetryExhausted {
                        attempts: task.attempt,
                        last: reason,
                    });
                }

                warn!(
                    "Transient upload failure for {} (attempt {}): {}; retrying in {:?}",
                    key, task.attempt, reason, backoff
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(config.max_backoff);
            }
        }
    }
}
