use crate::synth::{SpeechRequest, SpeechService, SynthError, SynthEvent};
use crate::voice::Voice;
use futures::future::BoxFuture;
use futures::FutureExt;
use rodio::source::Source;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;

const WAV_HEADER_BYTES: usize = 44;
const FALLBACK_SAMPLE_RATE: u32 = 22_050;
const FALLBACK_CHANNELS: u16 = 1;

// espeak-ng neutral settings: 175 wpm, pitch 50/99, amplitude 100/200.
const BASE_SPEED_WPM: f32 = 175.0;
const BASE_PITCH: f32 = 50.0;
const BASE_AMPLITUDE: f32 = 100.0;

/// Keeps the rodio [`OutputStream`] alive across utterances. Opening a fresh
/// stream per clip makes rodio drop the previous stream mid-playback.
struct LazyStream {
    stream: Mutex<Option<OutputStream>>,
}

impl LazyStream {
    fn new() -> Self {
        Self {
            stream: Mutex::new(None),
        }
    }

    fn connect_sink(&self) -> Result<Sink, SynthError> {
        let mut guard = match self.stream.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("output stream cache lock was poisoned; recovering");
                poisoned.into_inner()
            }
        };

        if guard.is_none() {
            let stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
                SynthError::AudioOutputUnavailable {
                    details: format!("open default output stream: {e}"),
                }
            })?;
            *guard = Some(stream);
        }

        match guard.as_ref() {
            Some(stream) => {
                let mixer = stream.mixer();
                Ok(Sink::connect_new(&mixer))
            }
            None => Err(SynthError::AudioOutputUnavailable {
                details: "internal error: output stream cache invariant violated".to_owned(),
            }),
        }
    }
}

/// [`SpeechService`] backed by the `espeak-ng` command-line engine and the
/// default audio output device.
///
/// Voices come from `espeak-ng --voices`; utterances are synthesized to WAV
/// via `espeak-ng --stdout` and played through a per-utterance rodio [`Sink`],
/// which carries the platform's native pause/resume/stop.
#[derive(Clone)]
pub struct EspeakSpeechService {
    binary: PathBuf,
    events: Arc<Mutex<Option<mpsc::UnboundedSender<SynthEvent>>>>,
    sink: Arc<Mutex<Option<Arc<Sink>>>>,
    output_stream: Arc<LazyStream>,
}

impl EspeakSpeechService {
    pub fn new(binary: PathBuf) -> Self {
        Self {
            binary,
            events: Arc::new(Mutex::new(None)),
            sink: Arc::new(Mutex::new(None)),
            output_stream: Arc::new(LazyStream::new()),
        }
    }

    fn emit(events: &Mutex<Option<mpsc::UnboundedSender<SynthEvent>>>, event: SynthEvent) {
        let guard = match events.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(event);
        }
    }

    fn current_sink(&self) -> Option<Arc<Sink>> {
        let guard = match self.sink.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone()
    }

    async fn run_engine(binary: &PathBuf, request: &SpeechRequest) -> Result<Vec<u8>, SynthError> {
        let mut cmd = Command::new(binary);
        if let Some(voice) = request.voice.as_ref() {
            cmd.arg("-v").arg(&voice.language);
        }
        cmd.arg("-s")
            .arg(speed_wpm(request.rate).to_string())
            .arg("-p")
            .arg(pitch_setting(request.pitch).to_string())
            .arg("-a")
            .arg(amplitude(request.volume).to_string())
            .arg("--stdin")
            .arg("--stdout")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            let path = binary.display();
            SynthError::EngineUnavailable {
                details: format!("failed to spawn espeak-ng at {path}: {e}"),
            }
        })?;

        {
            let stdin = child.stdin.as_mut().ok_or_else(|| SynthError::EngineFailed {
                details: "failed to open espeak-ng stdin".into(),
            })?;
            stdin
                .write_all(request.text.as_bytes())
                .await
                .map_err(|e| SynthError::EngineFailed {
                    details: format!("espeak-ng stdin write failed: {e}"),
                })?;
        }
        child.stdin.take();

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SynthError::EngineFailed {
                details: format!("espeak-ng process failed: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let status = output.status;
            return Err(SynthError::EngineFailed {
                details: format!("espeak-ng exited with {status}: {stderr}"),
            });
        }

        Ok(output.stdout)
    }
}

impl SpeechService for EspeakSpeechService {
    fn voices(&self) -> BoxFuture<'_, Result<Vec<Voice>, SynthError>> {
        let binary = self.binary.clone();
        async move {
            let output = Command::new(&binary)
                .arg("--voices")
                .output()
                .await
                .map_err(|e| {
                    let path = binary.display();
                    SynthError::EngineUnavailable {
                        details: format!("failed to run espeak-ng at {path}: {e}"),
                    }
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(SynthError::EngineFailed {
                    details: format!("espeak-ng --voices failed: {stderr}"),
                });
            }

            Ok(parse_voice_listing(&String::from_utf8_lossy(&output.stdout)))
        }
        .boxed()
    }

    fn speak(&self, request: SpeechRequest) -> BoxFuture<'_, Result<(), SynthError>> {
        let binary = self.binary.clone();
        let events = Arc::clone(&self.events);
        let sink_slot = Arc::clone(&self.sink);
        let output_stream = Arc::clone(&self.output_stream);

        async move {
            tracing::debug!(
                chars = request.text.len(),
                voice = request.voice.as_ref().map(|v| v.name.as_str()).unwrap_or("<default>"),
                rate = request.rate,
                pitch = request.pitch,
                volume = request.volume,
                "submitting utterance to espeak-ng"
            );

            // Submission is accepted here; synthesis and playback progress
            // arrive as events, the way platform callbacks would.
            tokio::spawn(async move {
                let wav = match Self::run_engine(&binary, &request).await {
                    Ok(wav) => wav,
                    Err(e) => {
                        tracing::warn!(error = %e, "speech synthesis failed");
                        Self::emit(&events, SynthEvent::Error { details: e.to_string() });
                        return;
                    }
                };

                let audio = match decode_wav(&wav) {
                    Ok(audio) => audio,
                    Err(e) => {
                        tracing::warn!(error = %e, "engine produced undecodable audio");
                        Self::emit(&events, SynthEvent::Error { details: e.to_string() });
                        return;
                    }
                };

                let sink = match output_stream.connect_sink() {
                    Ok(sink) => Arc::new(sink),
                    Err(e) => {
                        tracing::warn!(error = %e, "audio output unavailable");
                        Self::emit(&events, SynthEvent::Error { details: e.to_string() });
                        return;
                    }
                };

                {
                    let mut guard = match sink_slot.lock() {
                        Ok(g) => g,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    if let Some(old) = guard.take() {
                        old.stop();
                    }
                    *guard = Some(Arc::clone(&sink));
                }

                sink.append(PcmSource::new(
                    audio.pcm_i16,
                    audio.sample_rate_hz,
                    audio.channels,
                ));
                Self::emit(&events, SynthEvent::Started);

                let waiter = Arc::clone(&sink);
                let joined =
                    tokio::task::spawn_blocking(move || waiter.sleep_until_end()).await;
                if joined.is_err() {
                    tracing::warn!("playback waiter task failed");
                }

                {
                    let mut guard = match sink_slot.lock() {
                        Ok(g) => g,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    guard.take();
                }
                Self::emit(&events, SynthEvent::Ended);
            });

            Ok(())
        }
        .boxed()
    }

    fn pause(&self) -> BoxFuture<'_, Result<(), SynthError>> {
        let sink = self.current_sink();
        async move {
            if let Some(sink) = sink {
                sink.pause();
            }
            Ok(())
        }
        .boxed()
    }

    fn resume(&self) -> BoxFuture<'_, Result<(), SynthError>> {
        let sink = self.current_sink();
        async move {
            if let Some(sink) = sink {
                sink.play();
            }
            Ok(())
        }
        .boxed()
    }

    fn cancel_all(&self) -> BoxFuture<'_, Result<(), SynthError>> {
        let sink = {
            let mut guard = match self.sink.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.take()
        };
        async move {
            if let Some(sink) = sink {
                // Unblocks the waiter, which then emits Ended.
                sink.stop();
            }
            Ok(())
        }
        .boxed()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<SynthEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut guard = match self.events.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(tx);
        rx
    }
}

fn speed_wpm(rate: f32) -> i64 {
    (BASE_SPEED_WPM * rate).round() as i64
}

fn pitch_setting(pitch: f32) -> i64 {
    ((BASE_PITCH * pitch).round() as i64).clamp(0, 99)
}

fn amplitude(volume: f32) -> i64 {
    ((BASE_AMPLITUDE * volume).round() as i64).clamp(0, 200)
}

/// Parses `espeak-ng --voices` output. Columns:
/// `Pty Language Age/Gender VoiceName File Other Languages`.
fn parse_voice_listing(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return None;
            }
            Some(Voice::new(cols[3], cols[1]))
        })
        .collect()
}

struct DecodedAudio {
    sample_rate_hz: u32,
    channels: u16,
    pcm_i16: Vec<i16>,
}

/// Strips the canonical 44-byte RIFF header if present and chunks the
/// remainder as little-endian i16 PCM.
fn decode_wav(raw: &[u8]) -> Result<DecodedAudio, SynthError> {
    if raw.is_empty() {
        return Err(SynthError::EngineFailed {
            details: "engine produced no audio output".into(),
        });
    }

    let (header, pcm_bytes) = if raw.len() > WAV_HEADER_BYTES && &raw[..4] == b"RIFF" {
        (Some(&raw[..WAV_HEADER_BYTES]), &raw[WAV_HEADER_BYTES..])
    } else {
        (None, raw)
    };

    let (sample_rate_hz, channels) = match header {
        Some(h) => (
            u32::from_le_bytes([h[24], h[25], h[26], h[27]]),
            u16::from_le_bytes([h[22], h[23]]),
        ),
        None => (FALLBACK_SAMPLE_RATE, FALLBACK_CHANNELS),
    };

    let pcm_i16: Vec<i16> = pcm_bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    if pcm_i16.is_empty() {
        return Err(SynthError::EngineFailed {
            details: "engine produced empty PCM data".into(),
        });
    }

    Ok(DecodedAudio {
        sample_rate_hz: if sample_rate_hz == 0 {
            FALLBACK_SAMPLE_RATE
        } else {
            sample_rate_hz
        },
        channels: if channels == 0 { FALLBACK_CHANNELS } else { channels },
        pcm_i16,
    })
}

struct PcmSource {
    samples: std::vec::IntoIter<i16>,
    sample_rate: u32,
    channels: u16,
}

impl PcmSource {
    fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into_iter(),
            sample_rate,
            channels,
        }
    }
}

impl Iterator for PcmSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        self.samples.next().map(|s| s as f32 / i16::MAX as f32)
    }
}

impl Source for PcmSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        None
    }
}
