//! Persistent store for pipeline state.
//!
//! A process-local, `RwLock`-guarded store with typed repositories per
//! entity. The store is the single synchronization point of the pipeline:
//! every stage transition is one atomic read-then-write here, and the
//! video's status field acts as the authoritative lock against concurrent
//! runs.

pub mod error;
pub mod repos;
mod store;

pub use error::{StoreError, StoreResult};
pub use repos::{
    DubbingJobRepository, NewSegment, SegmentRepository, TranslationRepository, VideoRepository,
};
pub use store::Store;
