//! The backing store shared by all repositories.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use vloc_models::{DubbingJob, TranscriptionSegment, Translation, Video};

use crate::repos::{
    DubbingJobRepository, SegmentRepository, TranslationRepository, VideoRepository,
};

#[derive(Debug, Default)]
pub(crate) struct Inner {
    pub(crate) videos: BTreeMap<i64, Video>,
    pub(crate) segments: BTreeMap<i64, TranscriptionSegment>,
    pub(crate) translations: BTreeMap<i64, Translation>,
    pub(crate) dubbing_jobs: BTreeMap<i64, DubbingJob>,
    pub(crate) next_video_id: i64,
    pub(crate) next_segment_id: i64,
    pub(crate) next_translation_id: i64,
    pub(crate) next_dubbing_id: i64,
}

impl Inner {
    pub(crate) fn alloc_video_id(&mut self) -> i64 {
        self.next_video_id += 1;
        self.next_video_id
    }

    pub(crate) fn alloc_segment_id(&mut self) -> i64 {
        self.next_segment_id += 1;
        self.next_segment_id
    }

    pub(crate) fn alloc_translation_id(&mut self) -> i64 {
        self.next_translation_id += 1;
        self.next_translation_id
    }

    pub(crate) fn alloc_dubbing_id(&mut self) -> i64 {
        self.next_dubbing_id += 1;
        self.next_dubbing_id
    }
}

/// Handle to the shared store. Cheap to clone; all clones see the same
/// data.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub(crate) inner: Arc<RwLock<Inner>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Video repository.
    pub fn videos(&self) -> VideoRepository {
        VideoRepository::new(self.clone())
    }

    /// Transcription segment repository.
    pub fn segments(&self) -> SegmentRepository {
        SegmentRepository::new(self.clone())
    }

    /// Translation repository.
    pub fn translations(&self) -> TranslationRepository {
        TranslationRepository::new(self.clone())
    }

    /// Dubbing job repository.
    pub fn dubbing_jobs(&self) -> DubbingJobRepository {
        DubbingJobRepository::new(self.clone())
    }
}
