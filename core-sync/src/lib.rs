//! # Sync Module
//!
//! Brings photos into the catalog.
//!
//! ## Components
//!
//! - **Sync Orchestrator** (`coordinator`): lists a bucket, skips keys already
//!   cataloged, extracts metadata and inserts the rest
//! - **Sync Result** (`result`): per-run counts and error lines
//! - **Worker Client** (`worker`): the iCloud worker's HTTP contract
//! - **Challenges** (`challenge`): pending two-factor sessions and their window
//! - **iCloud Flow** (`icloud`): vault, worker and challenges tied together

pub mod challenge;
pub mod coordinator;
pub mod error;
pub mod icloud;
pub mod result;
pub mod worker;

pub use challenge::{ChallengeRegistry, PendingChallenge, CHALLENGE_TTL_SECS};
pub use coordinator::{SyncConfig, SyncOrchestrator};
pub use error::{Result, SyncError, WorkerError};
pub use icloud::{IcloudSync, IcloudSyncOutcome};
pub use result::SyncResult;
pub use worker::{WorkerClient, WorkerResponse, WorkerSyncSummary};
