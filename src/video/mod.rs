//! Image-to-video generation with automatic prompt revision.
//!
//! [`VideoOrchestrator`] submits a job to a [`VideoJobService`], polls it
//! until completion or timeout, rewrites the animation instruction when the
//! service rejects it on content-policy grounds, and stores the resulting
//! payload in a [`VideoStore`].

mod orchestrator;
mod policy;
mod progress;
mod revise;
mod service;
mod store;

pub use orchestrator::{
    OrchestratorConfig, VideoError, VideoOrchestrator, VideoResult, DEFAULT_GENERATION_TIMEOUT,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL,
};
pub use policy::{classify, is_policy_rejection, ErrorClass, POLICY_MARKERS};
pub use progress::{ChannelProgress, LogProgress, PrefixedProgress, ProgressSink};
pub use revise::{revision_prompt, PromptReviser};
pub use service::{
    FetchedPayload, GenerationJob, PayloadFetcher, SourceImage, TextGenerator, VideoJobService,
    DEFAULT_IMAGE_MIME,
};
pub use store::{default_dir as default_store_dir, VideoHandle, VideoStore};
