//! Durable submission state (§4.5) and the processing pipeline (§4.6).

pub mod metadata;
pub mod processor;
pub mod storage;

pub use metadata::{Metadata, Status, SubmissionId};
