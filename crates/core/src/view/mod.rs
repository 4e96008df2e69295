use crate::panel::{PanelState, Status};
use std::fmt::Write as _;

/// Primary action button label for the current playback status.
pub fn primary_label(status: Status) -> &'static str {
    match status {
        Status::Idle => "Convert To Speech",
        Status::Speaking => "Pause Speech",
        Status::Paused => "Resume Speech",
    }
}

pub fn primary_icon(status: Status) -> &'static str {
    match status {
        Status::Idle => "🔊",
        Status::Speaking => "⏸️",
        Status::Paused => "▶️",
    }
}

fn status_line(status: Status) -> Option<&'static str> {
    match status {
        Status::Idle => None,
        Status::Speaking => Some("● Speaking…"),
        Status::Paused => Some("● Paused"),
    }
}

/// Renders the whole panel as text. Pure: reads state, mutates nothing.
pub fn render(state: &PanelState) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "🎤 Text To Speech");
    let _ = writeln!(out, "✏️  Enter Your Text ({} characters)", state.text.chars().count());
    let _ = writeln!(out);

    let _ = writeln!(out, "🎧 Voice Selection ({} voices)", state.catalog.len());
    for (index, voice) in state.catalog.voices().iter().enumerate() {
        let marker = if state.catalog.selected_name() == Some(voice.name.as_str()) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} [{index}] {} {} ({})",
            voice.gender().icon(),
            voice.name,
            voice.language
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "⚡ Speed  {:.1}x", state.rate);
    let _ = writeln!(out, "🎵 Pitch  {:.1}", state.pitch);
    let _ = writeln!(out, "🔊 Volume {}%", (state.volume * 100.0).round() as i64);
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "[{} {}]",
        primary_icon(state.status),
        primary_label(state.status)
    );
    if state.status != Status::Idle {
        let _ = writeln!(out, "[⏹️ Stop]");
    }
    if let Some(line) = status_line(state.status) {
        let _ = writeln!(out, "{line}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::{Voice, VoiceCatalog};

    fn state_with(status: Status) -> PanelState {
        PanelState {
            status,
            ..PanelState::default()
        }
    }

    #[test]
    fn primary_label_follows_status() {
        assert_eq!(primary_label(Status::Idle), "Convert To Speech");
        assert_eq!(primary_label(Status::Speaking), "Pause Speech");
        assert_eq!(primary_label(Status::Paused), "Resume Speech");
    }

    #[test]
    fn idle_view_hides_stop_and_status_line() {
        let rendered = render(&state_with(Status::Idle));
        assert!(rendered.contains("Convert To Speech"));
        assert!(!rendered.contains("Stop"));
        assert!(!rendered.contains("Speaking…"));
        assert!(!rendered.contains("Paused"));
    }

    #[test]
    fn speaking_view_shows_stop_and_pulse_line() {
        let rendered = render(&state_with(Status::Speaking));
        assert!(rendered.contains("Pause Speech"));
        assert!(rendered.contains("[⏹️ Stop]"));
        assert!(rendered.contains("● Speaking…"));
    }

    #[test]
    fn paused_view_shows_resume_and_paused_line() {
        let rendered = render(&state_with(Status::Paused));
        assert!(rendered.contains("Resume Speech"));
        assert!(rendered.contains("● Paused"));
    }

    #[test]
    fn character_counter_counts_chars_not_bytes() {
        let mut state = PanelState::default();
        state.text = "héllo".to_owned();
        let rendered = render(&state);
        assert!(rendered.contains("(5 characters)"));
    }

    #[test]
    fn voices_render_with_gender_icon_and_language() {
        let mut catalog = VoiceCatalog::default();
        catalog.replace(
            vec![
                Voice::new("Microsoft Zira", "en-US"),
                Voice::new("Microsoft David", "en-GB"),
            ],
            "Google US English",
        );
        let state = PanelState {
            catalog,
            ..PanelState::default()
        };

        let rendered = render(&state);
        assert!(rendered.contains("👩 Microsoft Zira (en-US)"));
        assert!(rendered.contains("👨 Microsoft David (en-GB)"));
        assert!(rendered.contains("(2 voices)"));
        // First entry became the default selection.
        assert!(rendered.contains("> [0]"));
    }

    #[test]
    fn volume_readout_is_a_percentage() {
        let mut state = PanelState::default();
        state.volume = 0.7;
        let rendered = render(&state);
        assert!(rendered.contains("🔊 Volume 70%"));
    }
}
