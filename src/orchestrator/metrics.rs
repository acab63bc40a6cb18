use serde::Serialize;
use std::collections::HashMap;

/// Per-provider outcome counters for one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metrics {
    success_counts: HashMap<String, u64>,
    failure_counts: HashMap<String, u64>,
    retry_counts: HashMap<String, u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, provider_id: &str) {
        *self
            .success_counts
            .entry(provider_id.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_failure(&mut self, provider_id: &str) {
        *self
            .failure_counts
            .entry(provider_id.to_string())
            .or_insert(0) += 1;
    }

    /// `attempts` includes the first try; only the extra ones are counted.
    pub fn record_attempts(&mut self, provider_id: &str, attempts: u32) {
        if attempts > 1 {
            *self
                .retry_counts
                .entry(provider_id.to_string())
                .or_insert(0) += u64::from(attempts - 1);
        }
    }

    pub fn get_success_count(&self, provider_id: &str) -> u64 {
        *self.success_counts.get(provider_id).unwrap_or(&0)
    }

    pub fn get_failure_count(&self, provider_id: &str) -> u64 {
        *self.failure_counts.get(provider_id).unwrap_or(&0)
    }

    pub fn get_retry_count(&self, provider_id: &str) -> u64 {
        *self.retry_counts.get(provider_id).unwrap_or(&0)
    }

    pub fn get_success_rate(&self, provider_id: &str) -> f32 {
        let success = self.get_success_count(provider_id) as f32;
        let total = success + self.get_failure_count(provider_id) as f32;

        if total == 0.0 {
            0.0
        } else {
            success / total
        }
    }
}
