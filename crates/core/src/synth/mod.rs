mod espeak;
mod scripted;

use crate::voice::Voice;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub use espeak::EspeakSpeechService;
pub use scripted::{ScriptedSpeechService, ServiceCall};

/// One utterance submitted to the platform. Control values are captured at
/// submission time; later slider changes never touch an in-flight session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Asynchronous notifications from the platform. These are the authoritative
/// source of truth for entering Speaking and for forcing a return to Idle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum SynthEvent {
    /// The installed voice set changed; the catalog must be re-fetched.
    VoicesChanged,
    /// Audio for the current session started playing.
    Started,
    /// The current session finished or was cancelled.
    Ended,
    /// The current session failed; treated exactly like `Ended` by policy.
    Error { details: String },
}

#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    #[error("speech engine unavailable: {details}")]
    EngineUnavailable { details: String },

    #[error("speech engine failed: {details}")]
    EngineFailed { details: String },

    #[error("audio output unavailable: {details}")]
    AudioOutputUnavailable { details: String },
}

/// The platform speech-synthesis capability.
///
/// `speak` is a non-blocking submit: it returns once the request is accepted
/// and the session's progress arrives as [`SynthEvent`]s on the subscription
/// channel. `pause`/`resume`/`cancel_all` operate on the single implicit
/// active session.
pub trait SpeechService: Send + Sync {
    fn voices(&self) -> BoxFuture<'_, Result<Vec<Voice>, SynthError>>;

    fn speak(&self, request: SpeechRequest) -> BoxFuture<'_, Result<(), SynthError>>;

    fn pause(&self) -> BoxFuture<'_, Result<(), SynthError>>;

    fn resume(&self) -> BoxFuture<'_, Result<(), SynthError>>;

    fn cancel_all(&self) -> BoxFuture<'_, Result<(), SynthError>>;

    /// Subscribes to platform notifications. A later call replaces the
    /// previous subscriber; dropping the receiver unsubscribes.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SynthEvent>;
}
