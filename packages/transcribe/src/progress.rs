//! Progress reporting for transcription.
//!
//! [`Transcriber::transcribe_batch`](crate::Transcriber::transcribe_batch)
//! reports one unit per input form and names the form being worked on.
//! The CLI renders this with `indicatif`; library callers that do not care
//! pass [`null_progress`].

use std::sync::Arc;

/// Receives per-form progress from a transcription run.
pub trait ProgressCallback: Send + Sync {
    /// Number of forms the run will process.
    fn set_total(&self, total: u64);

    /// `delta` more forms are done, whether they succeeded or failed.
    fn inc(&self, delta: u64);

    /// Names the form currently being transcribed.
    fn set_message(&self, msg: String);

    /// The run is over; `msg` summarizes it.
    fn finish(&self, msg: String);

    fn finish_and_clear(&self);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
