use serde::Serialize;

/// Progress of a batch synthesis run, emitted once per finished segment.
#[derive(Debug, Clone, Serialize)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub group_index: usize,
    pub segment_index: usize,
    pub status: SegmentStatus,
}

impl BatchProgress {
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f32 * 100.0 / self.total as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SegmentStatus {
    Completed,
    Failed { error: String },
}
