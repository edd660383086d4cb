//! VideoOrchestrator - drives one image-to-video generation to completion.
//!
//! One call to [`VideoOrchestrator::produce_video`] runs up to
//! `max_attempts` submit/poll cycles. A content-policy rejection rewrites the
//! animation instruction and starts the next attempt; every other failure is
//! terminal and surfaces as a [`VideoError`].

use std::time::Duration;

use tokio::time::Instant;

use super::policy::{classify, is_policy_rejection, ErrorClass};
use super::progress::ProgressSink;
use super::revise::PromptReviser;
use super::service::{PayloadFetcher, SourceImage, TextGenerator, VideoJobService};
use super::store::{VideoHandle, VideoStore};
use crate::gemini::GeminiError;

/// Default number of submissions per invocation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default polling interval for job status checks (15 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Default ceiling on one attempt's wait for completion (5 minutes).
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Retry and polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub max_attempts: u32,
    pub poll_interval: Duration,
    /// Measured from the submission of each attempt's job.
    pub timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }
}

/// A successfully generated clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoResult {
    pub handle: VideoHandle,
    /// The instruction that produced the clip; differs from the caller's
    /// input when a rewrite happened.
    pub final_prompt: String,
}

/// How one attempt ended, when it did not fail terminally.
enum AttemptOutcome {
    /// The job produced a video at this reference.
    Ready(String),
    /// Moderation rejected the job with this message.
    PolicyRejection(String),
}

pub struct VideoOrchestrator<S, T> {
    service: S,
    reviser: PromptReviser<T>,
    store: VideoStore,
    config: OrchestratorConfig,
}

impl<S, T> VideoOrchestrator<S, T>
where
    S: VideoJobService + PayloadFetcher,
    T: TextGenerator,
{
    /// Create an orchestrator with the default configuration.
    ///
    /// `service` submits, polls and downloads; `rewriter` backs the prompt
    /// revision used after policy rejections.
    pub fn new(service: S, rewriter: T, store: VideoStore) -> Self {
        Self {
            service,
            reviser: PromptReviser::new(rewriter),
            store,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn store(&self) -> &VideoStore {
        &self.store
    }

    /// Animate `image` according to `instruction`.
    ///
    /// Progress lines are reported through `progress` as the job moves
    /// along. On success the payload has been written to the store and the
    /// returned result carries its handle plus the instruction that
    /// finally succeeded.
    ///
    /// # Errors
    ///
    /// - `EmptyInstruction` for a blank instruction (nothing is submitted)
    /// - `Timeout` when a job stays incomplete past the configured ceiling
    /// - `Service` for non-policy errors reported by the service
    /// - `MissingResult` when a job completes without a video reference
    /// - `Download` when the payload fetch returns a failure status
    /// - `RetriesExhausted` when every attempt was rejected by moderation
    /// - `Request` / `Storage` for transport and local write failures
    pub async fn produce_video(
        &self,
        image: &SourceImage,
        instruction: &str,
        progress: &dyn ProgressSink,
    ) -> Result<VideoResult, VideoError> {
        if instruction.trim().is_empty() {
            return Err(VideoError::EmptyInstruction);
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut current = instruction.to_string();
        let mut attempt = 1;

        loop {
            let message = match self
                .run_attempt(image, &current, attempt, max_attempts, progress)
                .await?
            {
                AttemptOutcome::Ready(uri) => {
                    return self.fetch_and_store(&uri, current, progress).await;
                }
                AttemptOutcome::PolicyRejection(message) => message,
            };

            if attempt >= max_attempts {
                log::error!(
                    "Prompt still rejected after {} attempts: {}",
                    attempt,
                    message
                );
                return Err(VideoError::RetriesExhausted {
                    attempts: attempt,
                    last_message: message,
                });
            }

            log::warn!(
                "Policy rejection (attempt {}/{}): {}",
                attempt,
                max_attempts,
                message
            );
            progress.notify(&format!(
                "Prompt may contain sensitive content, rewriting it automatically... (attempt {}/{})",
                attempt, max_attempts
            ));
            current = self.reviser.revise(&current).await;
            progress.notify("New prompt generated, retrying...");
            attempt += 1;
        }
    }

    /// Submit one job and wait for it to finish.
    async fn run_attempt(
        &self,
        image: &SourceImage,
        prompt: &str,
        attempt: u32,
        max_attempts: u32,
        progress: &dyn ProgressSink,
    ) -> Result<AttemptOutcome, VideoError> {
        progress.notify(&format!(
            "Generating video, this may take a few minutes... (attempt {}/{})",
            attempt, max_attempts
        ));

        let mut job = match self.service.submit(image, prompt).await {
            Ok(job) => job,
            Err(e) => return reject_or_fail(e),
        };
        log::info!(
            "Video job submitted: {} (attempt {}/{})",
            job.id,
            attempt,
            max_attempts
        );

        let started = Instant::now();
        while !job.done {
            let elapsed = started.elapsed();
            if elapsed > self.config.timeout {
                log::error!("Video job {} timed out after {:?}", job.id, elapsed);
                return Err(VideoError::Timeout { elapsed });
            }

            tokio::time::sleep(self.config.poll_interval).await;

            job = match self.service.poll(&job).await {
                Ok(job) => job,
                Err(e) => return reject_or_fail(e),
            };
            log::debug!("Video job {}: done={}", job.id, job.done);
        }

        if let Some(message) = job.error {
            return match classify(&message) {
                ErrorClass::PolicyRejection => Ok(AttemptOutcome::PolicyRejection(message)),
                ErrorClass::Terminal => {
                    log::error!("Video job {} failed: {}", job.id, message);
                    Err(VideoError::Service { message })
                }
            };
        }

        match job.first_video_uri() {
            Some(uri) => Ok(AttemptOutcome::Ready(uri.to_string())),
            None => {
                if !job.filtered_reasons.is_empty() {
                    log::warn!(
                        "Video job {} returned no video; filtered: {}",
                        job.id,
                        job.filtered_reasons.join("; ")
                    );
                }
                Err(VideoError::MissingResult)
            }
        }
    }

    async fn fetch_and_store(
        &self,
        uri: &str,
        final_prompt: String,
        progress: &dyn ProgressSink,
    ) -> Result<VideoResult, VideoError> {
        progress.notify("Downloading video...");

        let payload = self
            .service
            .fetch(uri)
            .await
            .map_err(|e| VideoError::Request(e.to_string()))?;
        if !payload.is_success() {
            log::error!("Video download failed with HTTP {}", payload.status);
            return Err(VideoError::Download {
                status: payload.status,
            });
        }

        let handle = self.store.store(&payload.bytes).await?;
        log::info!("Video saved to {}", handle.path().display());
        progress.notify("Video ready.");

        Ok(VideoResult {
            handle,
            final_prompt,
        })
    }
}

/// Map an error raised while submitting or polling.
///
/// A service-reported message carrying a policy marker counts as a
/// rejection, like an error on a completed job; everything else is terminal.
fn reject_or_fail(err: GeminiError) -> Result<AttemptOutcome, VideoError> {
    match err {
        GeminiError::ApiError { message, .. } if is_policy_rejection(&message) => {
            Ok(AttemptOutcome::PolicyRejection(message))
        }
        GeminiError::ApiError { status, message } => Err(VideoError::Service {
            message: format!("HTTP {}: {}", status, message),
        }),
        other => Err(VideoError::Request(other.to_string())),
    }
}

/// Terminal failures of a video generation.
#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("Animation instruction is empty")]
    EmptyInstruction,

    #[error("Video generation timed out after {secs}s, please try again later", secs = .elapsed.as_secs())]
    Timeout {
        /// Time waited on the last attempt's job
        elapsed: Duration,
    },

    #[error("Video service reported an error: {message}")]
    Service {
        /// Message reported by the service
        message: String,
    },

    #[error(
        "Could not get a video link. This may be caused by content review, a problem with the prompt, or a temporary service outage"
    )]
    MissingResult,

    #[error("Video download failed with HTTP status {status}")]
    Download {
        /// Status returned by the download endpoint
        status: u16,
    },

    #[error("Video generation failed: the prompt was still rejected after automatic revision ({attempts} attempts)")]
    RetriesExhausted {
        /// Number of submissions made
        attempts: u32,
        /// Rejection message of the final attempt
        last_message: String,
    },

    #[error("Video service request failed: {0}")]
    Request(String),

    #[error("Failed to store video: {0}")]
    Storage(#[from] std::io::Error),
}
