use crate::config::{
    PreferredVoice, PITCH_MAX, PITCH_MIN, RATE_MAX, RATE_MIN, VOLUME_MAX, VOLUME_MIN,
};
use crate::synth::{SpeechRequest, SpeechService, SynthError, SynthEvent};
use crate::voice::VoiceCatalog;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Playback status. Errors are folded back into `Idle`; there is no error
/// state.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// Everything the view renders: text, catalog, playback status, and the three
/// free-standing control values.
#[derive(Clone, Debug)]
pub struct PanelState {
    pub text: String,
    pub catalog: VoiceCatalog,
    pub status: Status,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            text: String::new(),
            catalog: VoiceCatalog::default(),
            status: Status::Idle,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PanelError {
    #[error(transparent)]
    Synth(#[from] SynthError),
}

/// The control panel: state store plus playback controller over an injected
/// [`SpeechService`].
///
/// User actions transition status optimistically; [`Panel::handle_event`] is
/// the single entry point where the platform's asynchronous notifications
/// reconcile it. At most one session is in flight: the primary action in
/// `Speaking`/`Paused` only ever pauses or resumes.
pub struct Panel<S: SpeechService> {
    service: S,
    state: PanelState,
    preferred: PreferredVoice,
}

impl<S: SpeechService> Panel<S> {
    pub fn new(service: S, preferred: PreferredVoice) -> Self {
        Self {
            service,
            state: PanelState::default(),
            preferred,
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    /// Hands out the platform notification channel. The caller owns the
    /// receiver and feeds every event back through [`Panel::handle_event`];
    /// dropping it unsubscribes.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SynthEvent> {
        self.service.subscribe()
    }

    pub fn set_text<T: Into<String>>(&mut self, text: T) {
        self.state.text = text.into();
    }

    /// Whether the primary action would do anything. Views disable the
    /// control on false.
    pub fn can_speak(&self) -> bool {
        !self.state.text.trim().is_empty()
    }

    pub fn set_rate(&mut self, value: f32) {
        if value.is_finite() {
            self.state.rate = value.clamp(RATE_MIN, RATE_MAX);
        }
    }

    pub fn set_pitch(&mut self, value: f32) {
        if value.is_finite() {
            self.state.pitch = value.clamp(PITCH_MIN, PITCH_MAX);
        }
    }

    pub fn set_volume(&mut self, value: f32) {
        if value.is_finite() {
            self.state.volume = value.clamp(VOLUME_MIN, VOLUME_MAX);
        }
    }

    pub fn select_voice(&mut self, name: &str) -> bool {
        self.state.catalog.select(name)
    }

    /// Fetches the platform's voice list and replaces the catalog wholesale,
    /// applying the preferred-name-then-first-entry default rule.
    pub async fn load_voices(&mut self) -> Result<(), PanelError> {
        let voices = self.service.voices().await?;
        tracing::debug!(count = voices.len(), "voice catalog loaded");
        self.state.catalog.replace(voices, self.preferred.as_str());
        Ok(())
    }

    /// The single user-facing primary action: start when idle, pause when
    /// speaking, resume when paused. A blank text makes this a no-op — the
    /// service is never called.
    pub async fn primary_action(&mut self) -> Result<(), PanelError> {
        if !self.can_speak() {
            return Ok(());
        }

        match self.state.status {
            Status::Idle => {
                let request = SpeechRequest {
                    text: self.state.text.clone(),
                    voice: self.state.catalog.selected_voice().cloned(),
                    rate: self.state.rate,
                    pitch: self.state.pitch,
                    volume: self.state.volume,
                };
                self.service.speak(request).await?;
                // Optimistic; the platform's Started notification confirms.
                self.state.status = Status::Speaking;
            }
            Status::Speaking => {
                self.service.pause().await?;
                self.state.status = Status::Paused;
            }
            Status::Paused => {
                self.service.resume().await?;
                self.state.status = Status::Speaking;
            }
        }
        Ok(())
    }

    /// Cancels all pending and active speech and returns to `Idle`. A no-op
    /// service-wise when nothing is playing.
    pub async fn stop(&mut self) -> Result<(), PanelError> {
        self.service.cancel_all().await?;
        self.state.status = Status::Idle;
        Ok(())
    }

    /// The only place platform notifications mutate status. `Ended` and
    /// `Error` force `Idle` regardless of local state, which also resolves
    /// the stop-versus-late-notification race.
    pub async fn handle_event(&mut self, event: SynthEvent) -> Result<(), PanelError> {
        match event {
            SynthEvent::Started => {
                self.state.status = Status::Speaking;
            }
            SynthEvent::Ended => {
                self.state.status = Status::Idle;
            }
            SynthEvent::Error { details } => {
                tracing::warn!(details = %details, "playback error reported by platform");
                self.state.status = Status::Idle;
            }
            SynthEvent::VoicesChanged => {
                self.load_voices().await?;
            }
        }
        Ok(())
    }

    /// Teardown: cancels any outstanding session so no audio handle leaks.
    /// The subscription ends when the caller drops the event receiver.
    pub async fn close(&mut self) -> Result<(), PanelError> {
        self.service.cancel_all().await?;
        self.state.status = Status::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{ScriptedSpeechService, ServiceCall};
    use crate::voice::Voice;

    fn panel_with_voices(voices: Vec<Voice>) -> Panel<ScriptedSpeechService> {
        let service = ScriptedSpeechService::with_voices(voices);
        Panel::new(service, PreferredVoice::default())
    }

    fn service_of(panel: &Panel<ScriptedSpeechService>) -> ScriptedSpeechService {
        panel.service.clone()
    }

    #[tokio::test]
    async fn blank_text_primary_action_is_a_no_op() {
        let mut panel = panel_with_voices(vec![Voice::new("Samantha", "en-US")]);
        panel.load_voices().await.expect("load");
        panel.set_text("   \n\t ");

        panel.primary_action().await.expect("primary");

        assert_eq!(panel.status(), Status::Idle);
        let calls = service_of(&panel).calls();
        assert!(!calls.iter().any(|c| matches!(c, ServiceCall::Speak(_))));
    }

    #[tokio::test]
    async fn primary_action_cycles_speak_pause_resume() {
        let mut panel = panel_with_voices(vec![Voice::new("Samantha", "en-US")]);
        panel.load_voices().await.expect("load");
        panel.set_text("Hello world");

        panel.primary_action().await.expect("speak");
        assert_eq!(panel.status(), Status::Speaking);

        panel.primary_action().await.expect("pause");
        assert_eq!(panel.status(), Status::Paused);

        panel.primary_action().await.expect("resume");
        assert_eq!(panel.status(), Status::Speaking);

        let calls = service_of(&panel).calls();
        assert!(matches!(calls[1], ServiceCall::Speak(_)));
        assert_eq!(calls[2], ServiceCall::Pause);
        assert_eq!(calls[3], ServiceCall::Resume);
    }

    #[tokio::test]
    async fn stop_cancels_and_returns_to_idle() {
        let mut panel = panel_with_voices(vec![Voice::new("Samantha", "en-US")]);
        panel.load_voices().await.expect("load");
        panel.set_text("Hello");

        panel.primary_action().await.expect("speak");
        panel.primary_action().await.expect("pause");
        panel.stop().await.expect("stop");

        assert_eq!(panel.status(), Status::Idle);
        let calls = service_of(&panel).calls();
        assert_eq!(calls.last(), Some(&ServiceCall::CancelAll));
    }

    #[tokio::test]
    async fn stop_while_idle_stays_idle() {
        let mut panel = panel_with_voices(Vec::new());
        panel.stop().await.expect("stop");
        assert_eq!(panel.status(), Status::Idle);
    }

    #[tokio::test]
    async fn end_notification_forces_idle_from_any_state() {
        let mut panel = panel_with_voices(vec![Voice::new("Samantha", "en-US")]);
        panel.load_voices().await.expect("load");
        panel.set_text("Hello");

        panel.primary_action().await.expect("speak");
        panel.primary_action().await.expect("pause");
        assert_eq!(panel.status(), Status::Paused);

        panel.handle_event(SynthEvent::Ended).await.expect("event");
        assert_eq!(panel.status(), Status::Idle);
    }

    #[tokio::test]
    async fn error_notification_forces_idle() {
        let mut panel = panel_with_voices(vec![Voice::new("Samantha", "en-US")]);
        panel.load_voices().await.expect("load");
        panel.set_text("Hello");
        panel.primary_action().await.expect("speak");

        panel
            .handle_event(SynthEvent::Error {
                details: "device failure".into(),
            })
            .await
            .expect("event");
        assert_eq!(panel.status(), Status::Idle);
    }

    #[tokio::test]
    async fn end_after_user_stop_still_resolves_to_idle() {
        let mut panel = panel_with_voices(vec![Voice::new("Samantha", "en-US")]);
        panel.load_voices().await.expect("load");
        panel.set_text("Hello");

        panel.primary_action().await.expect("speak");
        panel.stop().await.expect("stop");
        // The cancel's end notification arrives after the local transition.
        panel.handle_event(SynthEvent::Ended).await.expect("event");
        assert_eq!(panel.status(), Status::Idle);
    }

    #[tokio::test]
    async fn started_notification_confirms_speaking() {
        let mut panel = panel_with_voices(vec![Voice::new("Samantha", "en-US")]);
        panel.load_voices().await.expect("load");
        panel.set_text("Hello");
        panel.primary_action().await.expect("speak");

        panel.handle_event(SynthEvent::Started).await.expect("event");
        assert_eq!(panel.status(), Status::Speaking);
    }

    #[tokio::test]
    async fn control_setters_clamp_out_of_range_values() {
        let mut panel = panel_with_voices(Vec::new());

        panel.set_rate(5.0);
        assert_eq!(panel.state().rate, 2.0);
        panel.set_rate(0.1);
        assert_eq!(panel.state().rate, 0.5);

        panel.set_pitch(-3.0);
        assert_eq!(panel.state().pitch, 0.5);

        panel.set_volume(2.5);
        assert_eq!(panel.state().volume, 1.0);
        panel.set_volume(f32::NAN);
        assert_eq!(panel.state().volume, 1.0);
    }

    #[tokio::test]
    async fn session_captures_control_values_at_submission() {
        let mut panel = panel_with_voices(vec![Voice::new("Samantha", "en-US")]);
        panel.load_voices().await.expect("load");
        panel.set_text("Hello");
        panel.set_rate(1.5);
        panel.set_pitch(0.8);
        panel.set_volume(0.6);

        panel.primary_action().await.expect("speak");
        // Slider changes mid-speech must not touch the in-flight session.
        panel.set_rate(0.5);
        panel.set_volume(1.0);

        let calls = service_of(&panel).calls();
        let submitted = calls
            .iter()
            .find_map(|c| match c {
                ServiceCall::Speak(req) => Some(req.clone()),
                _ => None,
            })
            .expect("one session submitted");
        assert_eq!(submitted.rate, 1.5);
        assert_eq!(submitted.pitch, 0.8);
        assert_eq!(submitted.volume, 0.6);
    }

    #[tokio::test]
    async fn voices_changed_reloads_catalog_wholesale() {
        let service = ScriptedSpeechService::with_voices(vec![Voice::new("Samantha", "en-US")]);
        let mut panel = Panel::new(service.clone(), PreferredVoice::default());
        panel.load_voices().await.expect("load");
        assert_eq!(panel.state().catalog.selected_name(), Some("Samantha"));

        service.set_voices(vec![
            Voice::new("Google US English", "en-US"),
            Voice::new("Microsoft David", "en-US"),
        ]);
        panel
            .handle_event(SynthEvent::VoicesChanged)
            .await
            .expect("event");

        assert_eq!(panel.state().catalog.len(), 2);
        assert_eq!(
            panel.state().catalog.selected_name(),
            Some("Google US English")
        );
    }

    #[tokio::test]
    async fn scenario_default_selection_and_submit_with_preferred_voice() {
        let mut panel = panel_with_voices(vec![
            Voice::new("Google US English", "en-US"),
            Voice::new("Microsoft David", "en-US"),
        ]);
        panel.load_voices().await.expect("load");
        assert_eq!(
            panel.state().catalog.selected_name(),
            Some("Google US English")
        );

        panel.set_text("Hello world");
        panel.primary_action().await.expect("speak");
        assert_eq!(panel.status(), Status::Speaking);

        let calls = service_of(&panel).calls();
        let submitted = calls
            .iter()
            .find_map(|c| match c {
                ServiceCall::Speak(req) => Some(req.clone()),
                _ => None,
            })
            .expect("session submitted");
        assert_eq!(
            submitted.voice.map(|v| v.name),
            Some("Google US English".to_owned())
        );
        assert_eq!(submitted.text, "Hello world");
    }

    #[tokio::test]
    async fn scenario_first_entry_fallback_is_male_david() {
        use crate::voice::Gender;

        let mut panel = panel_with_voices(vec![Voice::new("Microsoft David", "en-US")]);
        panel.load_voices().await.expect("load");

        let selected = panel.state().catalog.selected_voice().expect("selected");
        assert_eq!(selected.name, "Microsoft David");
        assert_eq!(selected.gender(), Gender::Male);
    }

    #[tokio::test]
    async fn close_cancels_outstanding_session() {
        let mut panel = panel_with_voices(vec![Voice::new("Samantha", "en-US")]);
        panel.load_voices().await.expect("load");
        panel.set_text("Hello");
        panel.primary_action().await.expect("speak");

        panel.close().await.expect("close");
        assert_eq!(panel.status(), Status::Idle);
        let calls = service_of(&panel).calls();
        assert_eq!(calls.last(), Some(&ServiceCall::CancelAll));
    }

    #[tokio::test]
    async fn events_flow_from_service_subscription() {
        let service = ScriptedSpeechService::new();
        let panel = Panel::new(service.clone(), PreferredVoice::default());
        let mut events = panel.subscribe();

        service.emit(SynthEvent::Started);
        service.emit(SynthEvent::Ended);

        assert_eq!(events.recv().await, Some(SynthEvent::Started));
        assert_eq!(events.recv().await, Some(SynthEvent::Ended));
    }
}
