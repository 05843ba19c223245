//! Image retrieval
//!
//! The coordinator deduplicates ranked URLs, names destination files and
//! paces requests. Bytes move through a [`FileTransfer`] collaborator.

mod coordinator;
mod transfer;

pub use coordinator::{
    derive_extension, pacing_interval, RetrievalCoordinator, RetrievalFailure, RetrievalReport,
};
pub use transfer::{FileTransfer, HttpTransfer, TransferError, TransferOptions};
