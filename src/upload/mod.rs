//! Background upload of finalized clips to remote object storage.
//!
//! The worker owns the retry contract (bounded exponential backoff over
//! transient errors, fail-fast on permanent ones) and reports one terminal
//! outcome per task; the local file is never deleted here.

mod store;
mod worker;

pub use store::{FsObjectStore, ObjectStore, StoreError};
pub use worker::{UploadConfig, UploadError, UploadHandle, UploadOutcome, UploadTask, UploadWorker};
