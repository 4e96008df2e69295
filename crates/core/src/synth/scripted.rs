use crate::synth::{SpeechRequest, SpeechService, SynthError, SynthEvent};
use crate::voice::Voice;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Every operation invoked on a [`ScriptedSpeechService`], in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceCall {
    Voices,
    Speak(SpeechRequest),
    Pause,
    Resume,
    CancelAll,
}

#[derive(Default)]
struct Inner {
    voices: Vec<Voice>,
    calls: Vec<ServiceCall>,
    events: Option<mpsc::UnboundedSender<SynthEvent>>,
}

/// In-memory [`SpeechService`] for tests and demos: records every call,
/// serves a settable voice list, and lets the driver inject platform
/// notifications without real audio hardware.
#[derive(Clone, Default)]
pub struct ScriptedSpeechService {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedSpeechService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voices(voices: Vec<Voice>) -> Self {
        let service = Self::new();
        service.lock().voices = voices;
        service
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replaces the served voice list and notifies the subscriber the way a
    /// real platform would.
    pub fn set_voices(&self, voices: Vec<Voice>) {
        self.lock().voices = voices;
        self.emit(SynthEvent::VoicesChanged);
    }

    /// Injects a platform notification. Dropped silently when nothing is
    /// subscribed, matching a notification nobody listens to.
    pub fn emit(&self, event: SynthEvent) {
        let guard = self.lock();
        if let Some(tx) = guard.events.as_ref() {
            let _ = tx.send(event);
        }
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.lock().calls.clone()
    }

    fn record(&self, call: ServiceCall) {
        self.lock().calls.push(call);
    }
}

impl SpeechService for ScriptedSpeechService {
    fn voices(&self) -> BoxFuture<'_, Result<Vec<Voice>, SynthError>> {
        self.record(ServiceCall::Voices);
        let voices = self.lock().voices.clone();
        async move { Ok(voices) }.boxed()
    }

    fn speak(&self, request: SpeechRequest) -> BoxFuture<'_, Result<(), SynthError>> {
        self.record(ServiceCall::Speak(request));
        async move { Ok(()) }.boxed()
    }

    fn pause(&self) -> BoxFuture<'_, Result<(), SynthError>> {
        self.record(ServiceCall::Pause);
        async move { Ok(()) }.boxed()
    }

    fn resume(&self) -> BoxFuture<'_, Result<(), SynthError>> {
        self.record(ServiceCall::Resume);
        async move { Ok(()) }.boxed()
    }

    fn cancel_all(&self) -> BoxFuture<'_, Result<(), SynthError>> {
        self.record(ServiceCall::CancelAll);
        async move { Ok(()) }.boxed()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<SynthEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().events = Some(tx);
        rx
    }
}
