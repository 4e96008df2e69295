#![deny(warnings)]

use anyhow::Context;
use clap::Parser;
use speech_panel_core::config::{
    resolve_string_with_default, AppConfig, EngineConfig, PreferredVoice, StdEnv,
    DEFAULT_ENGINE_BINARY, DEFAULT_PREFERRED_VOICE, ENV_ENGINE_BINARY, ENV_PREFERRED_VOICE,
};
use speech_panel_core::panel::Panel;
use speech_panel_core::synth::{EspeakSpeechService, SpeechService};
use speech_panel_core::view;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "speech-panel")]
#[command(about = "Interactive text-to-speech control panel (platform engine via espeak-ng)")]
struct Args {
    /// Path to the speech engine binary.
    #[arg(long)]
    engine: Option<String>,

    /// Preferred default voice name.
    #[arg(long)]
    voice: Option<String>,

    /// Print the platform's voice catalog and exit.
    #[arg(long, default_value_t = false)]
    list_voices: bool,

    /// With --list-voices, emit JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, PartialEq)]
enum Command {
    Quit,
    Primary,
    Stop,
    Rate(f32),
    Pitch(f32),
    Volume(f32),
    Voice(usize),
    ReloadVoices,
    SetText(String),
    Nothing,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Nothing;
    }
    if !trimmed.starts_with(':') {
        return Command::SetText(line.to_owned());
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim);

    match (verb, arg) {
        (":q" | ":quit", _) => Command::Quit,
        (":p" | ":play", _) => Command::Primary,
        (":s" | ":stop", _) => Command::Stop,
        (":rate", Some(v)) => match v.parse() {
            Ok(n) => Command::Rate(n),
            Err(_) => Command::Unknown(trimmed.to_owned()),
        },
        (":pitch", Some(v)) => match v.parse() {
            Ok(n) => Command::Pitch(n),
            Err(_) => Command::Unknown(trimmed.to_owned()),
        },
        (":vol", Some(v)) => match v.parse() {
            Ok(n) => Command::Volume(n),
            Err(_) => Command::Unknown(trimmed.to_owned()),
        },
        (":voice", Some(v)) => match v.parse() {
            Ok(n) => Command::Voice(n),
            Err(_) => Command::Unknown(trimmed.to_owned()),
        },
        (":voices", _) => Command::ReloadVoices,
        _ => Command::Unknown(trimmed.to_owned()),
    }
}

const HELP: &str = "\
Type a line of text to set the utterance, then:
  :play          start / pause / resume
  :stop          cancel playback
  :rate 1.5      playback speed (0.5-2.0)
  :pitch 0.8     voice pitch (0.5-2.0)
  :vol 0.7       volume (0.0-1.0)
  :voice 2       select voice by index
  :voices        reload the voice catalog
  :quit          exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let cfg = build_config(args.engine.clone(), args.voice.clone(), &env)?;

    tracing::info!(
        engine = %cfg.engine.binary.display(),
        preferred_voice = %cfg.preferred_voice.as_str(),
        "config loaded"
    );

    let service = EspeakSpeechService::new(cfg.engine.binary.clone());

    if args.list_voices {
        return list_voices(&service, args.json).await;
    }

    run_panel(service, cfg).await
}

async fn list_voices(service: &EspeakSpeechService, json: bool) -> anyhow::Result<()> {
    let voices = service.voices().await.context("failed to list voices")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&voices)?);
    } else {
        for voice in &voices {
            println!("{} {} ({})", voice.gender().icon(), voice.name, voice.language);
        }
        println!("{} voices", voices.len());
    }
    Ok(())
}

async fn run_panel(service: EspeakSpeechService, cfg: AppConfig) -> anyhow::Result<()> {
    let mut panel = Panel::new(service, cfg.preferred_voice);
    let mut events = panel.subscribe();
    panel.load_voices().await.context("initial voice load failed")?;

    println!("{HELP}\n");
    print!("{}", view::render(panel.state()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                panel.handle_event(event).await?;
                print!("{}", view::render(panel.state()));
            }
            line = lines.next_line() => {
                let Some(line) = line.context("stdin read failed")? else { break };
                match parse_command(&line) {
                    Command::Quit => break,
                    Command::Primary => panel.primary_action().await?,
                    Command::Stop => panel.stop().await?,
                    Command::Rate(v) => panel.set_rate(v),
                    Command::Pitch(v) => panel.set_pitch(v),
                    Command::Volume(v) => panel.set_volume(v),
                    Command::Voice(index) => {
                        let name = panel
                            .state()
                            .catalog
                            .voices()
                            .get(index)
                            .map(|v| v.name.clone());
                        match name {
                            Some(name) => {
                                panel.select_voice(&name);
                            }
                            None => println!("no voice at index {index}"),
                        }
                    }
                    Command::ReloadVoices => panel.load_voices().await?,
                    Command::SetText(text) => panel.set_text(text),
                    Command::Nothing => continue,
                    Command::Unknown(cmd) => {
                        println!("unrecognized command: {cmd}");
                        continue;
                    }
                }
                print!("{}", view::render(panel.state()));
            }
        }
    }

    // Teardown: cancel any in-flight session before dropping the receiver.
    panel.close().await?;
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(
    engine: Option<String>,
    voice: Option<String>,
    env: &impl speech_panel_core::config::Env,
) -> anyhow::Result<AppConfig> {
    let binary = resolve_string_with_default(engine, ENV_ENGINE_BINARY, env, DEFAULT_ENGINE_BINARY);
    let preferred = resolve_string_with_default(
        voice,
        ENV_PREFERRED_VOICE,
        env,
        DEFAULT_PREFERRED_VOICE,
    );

    Ok(AppConfig {
        preferred_voice: PreferredVoice::new(preferred)?,
        engine: EngineConfig {
            binary: PathBuf::from(binary),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use speech_panel_core::config::MapEnv;

    #[test]
    fn parse_command_handles_text_and_verbs() {
        assert_eq!(parse_command("Hello world"), Command::SetText("Hello world".into()));
        assert_eq!(parse_command(":play"), Command::Primary);
        assert_eq!(parse_command(":rate 1.5"), Command::Rate(1.5));
        assert_eq!(parse_command(":voice 2"), Command::Voice(2));
        assert_eq!(parse_command("   "), Command::Nothing);
        assert_eq!(
            parse_command(":rate fast"),
            Command::Unknown(":rate fast".into())
        );
    }

    #[test]
    fn build_config_cli_over_env_over_default() {
        let env = MapEnv::default().with_var(ENV_ENGINE_BINARY, "/usr/bin/espeak-ng");

        let cfg = build_config(None, None, &env).expect("config");
        assert_eq!(cfg.engine.binary, PathBuf::from("/usr/bin/espeak-ng"));
        assert_eq!(cfg.preferred_voice.as_str(), DEFAULT_PREFERRED_VOICE);

        let cfg = build_config(Some("espeak".into()), Some("Samantha".into()), &env)
            .expect("config");
        assert_eq!(cfg.engine.binary, PathBuf::from("espeak"));
        assert_eq!(cfg.preferred_voice.as_str(), "Samantha");
    }
}
