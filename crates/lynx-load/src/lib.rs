//! Loading transformed batches into the remote import API.
//!
//! A batch is split into chunks; each chunk is one import request, retried
//! under a [`RetryPolicy`]. A chunk that exhausts its attempts fails the whole
//! load and no later chunk is sent.

pub mod client;
pub mod error;
pub mod loader;
pub mod retry;

pub use client::{
    HttpImportClient, ImportClient, ImportResponse, ImportStatus, ImportTarget, import_payload,
};
pub use error::LoadError;
pub use loader::{ChunkReport, DataLoader, DryRunLoader, ImportLoader, LoadSummary, batch_to_records};
pub use retry::{Backoff, RetryPolicy, Sleeper, ThreadSleeper};
