use crate::audio::wav;
use crate::input::{segment_texts, InputItem};
use crate::session::{BatchProgress, Group, Segment, SegmentAudio, SegmentStatus, Workspace};
use crate::tts::{SynthesisAdapter, SynthesisRequest, VoiceSettings};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use self::metrics::Metrics;
use self::retry::RetryPolicy;

pub mod metrics;
pub mod retry;

pub struct BatchOptions {
    pub voice: VoiceSettings,
    pub split_sentences: bool,
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            voice: VoiceSettings::default(),
            split_sentences: false,
            concurrency: 1,
            retry: RetryPolicy::default(),
        }
    }
}

pub struct BatchReport {
    pub workspace: Workspace,
    pub metrics: Metrics,
}

struct Job {
    group_index: usize,
    segment_index: usize,
    text: String,
}

struct JobResult {
    group_index: usize,
    segment_index: usize,
    audio: SegmentAudio,
    attempts: u32,
}

/// Drives synthesis of a whole batch through one adapter.
///
/// Up to `concurrency` requests are in flight at once. Each segment is
/// retried per the [`RetryPolicy`]; a segment that still fails, or whose
/// audio does not decode, is stored as failed and the batch carries on.
/// Groups and segments come back in input order regardless of completion
/// order.
pub struct BatchSynthesizer {
    adapter: Arc<dyn SynthesisAdapter>,
    options: BatchOptions,
}

impl BatchSynthesizer {
    pub fn new(adapter: Arc<dyn SynthesisAdapter>, options: BatchOptions) -> Self {
        Self { adapter, options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub async fn run<F>(&self, items: &[InputItem], mut on_progress: F) -> BatchReport
    where
        F: FnMut(&BatchProgress),
    {
        let texts: Vec<Vec<String>> = items
            .iter()
            .map(|item| segment_texts(item, self.options.split_sentences))
            .collect();
        let total: usize = texts.iter().map(Vec::len).sum();

        tracing::info!(
            "Batch started: {} items, {} segments, concurrency {}",
            items.len(),
            total,
            self.options.concurrency.max(1)
        );

        let jobs = texts.iter().enumerate().flat_map(|(group_index, segments)| {
            segments
                .iter()
                .enumerate()
                .map(move |(segment_index, text)| Job {
                    group_index,
                    segment_index,
                    text: text.clone(),
                })
        });

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for job in jobs {
            let semaphore = semaphore.clone();
            let adapter = self.adapter.clone();
            let voice = self.options.voice.clone();
            let retry = self.options.retry.clone();
            tasks.spawn(async move {
                // Never closed; a failed acquire would only skip the limit.
                let _permit = semaphore.acquire_owned().await.ok();
                let (audio, attempts) =
                    synthesize_with_retry(adapter.as_ref(), &retry, &voice, &job.text).await;
                JobResult {
                    group_index: job.group_index,
                    segment_index: job.segment_index,
                    audio,
                    attempts,
                }
            });
        }

        let mut slots: Vec<Vec<Option<SegmentAudio>>> =
            texts.iter().map(|t| vec![None; t.len()]).collect();
        let mut metrics = Metrics::new();
        let provider = self.adapter.name().to_string();
        let mut processed = 0usize;

        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Synthesis task aborted: {}", e);
                    continue;
                }
            };

            metrics.record_attempts(&provider, result.attempts);
            let status = match &result.audio {
                SegmentAudio::Ready(_) => {
                    metrics.record_success(&provider);
                    SegmentStatus::Completed
                }
                SegmentAudio::Failed(error) => {
                    metrics.record_failure(&provider);
                    SegmentStatus::Failed {
                        error: error.clone(),
                    }
                }
            };

            processed += 1;
            on_progress(&BatchProgress {
                processed,
                total,
                group_index: result.group_index,
                segment_index: result.segment_index,
                status,
            });
            slots[result.group_index][result.segment_index] = Some(result.audio);
        }

        let groups = items
            .iter()
            .zip(texts)
            .zip(slots)
            .map(|((item, texts), audios)| {
                let segments = texts
                    .into_iter()
                    .zip(audios)
                    .map(|(text, audio)| {
                        let audio = audio.unwrap_or_else(|| {
                            SegmentAudio::Failed("Synthesis task aborted".to_string())
                        });
                        Segment::new(text, audio)
                    })
                    .collect();
                Group::with_segments(item.label.clone(), segments)
            })
            .collect();

        tracing::info!(
            "Batch finished: {} succeeded, {} failed",
            metrics.get_success_count(&provider),
            metrics.get_failure_count(&provider)
        );

        BatchReport {
            workspace: Workspace::from_groups(groups),
            metrics,
        }
    }

    /// Synthesize a single text, e.g. to regenerate one segment.
    pub async fn synthesize_one(&self, text: &str) -> SegmentAudio {
        let (audio, _) = synthesize_with_retry(
            self.adapter.as_ref(),
            &self.options.retry,
            &self.options.voice,
            text,
        )
        .await;
        audio
    }

    /// Regenerate one segment of a workspace with new text.
    pub async fn regenerate(
        &self,
        workspace: &mut Workspace,
        group_index: usize,
        segment_index: usize,
        text: &str,
    ) -> Result<(), crate::session::SessionError> {
        workspace.group(group_index)?.segment(segment_index)?;
        let audio = self.synthesize_one(text).await;
        workspace.regenerate_segment(group_index, segment_index, text, audio)
    }
}

async fn synthesize_with_retry(
    adapter: &dyn SynthesisAdapter,
    retry: &RetryPolicy,
    voice: &VoiceSettings,
    text: &str,
) -> (SegmentAudio, u32) {
    let request = SynthesisRequest::new(text, voice);
    let (result, attempts) = retry.run(|| adapter.synthesize(&request)).await;

    let audio = match result {
        Ok(bytes) => match wav::decode(&bytes) {
            Ok(buffer) => SegmentAudio::Ready(buffer.into_shared()),
            Err(e) => {
                tracing::error!("Segment audio did not decode: {}", e);
                SegmentAudio::Failed(e.to_string())
            }
        },
        Err(e) => {
            tracing::error!("Segment failed after {} attempts: {}", attempts, e);
            SegmentAudio::Failed(e.to_string())
        }
    };
    (audio, attempts)
}
