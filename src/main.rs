use std::process::ExitCode;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use pair_voice::voice::{
    AudioCapture, AudioPlayback, DEEPGRAM_WAKE_MODEL, ELEVENLABS_DEFAULT_VOICE, ManualWakeWord,
    MicrophoneInput, MicrophoneWakeWord, Speaker, SpeechToText, TextToSpeech, peak, rms, test_tone,
};
use pair_voice::{
    Capabilities, CodeRabbitReviewer, CompletionClassifier, Config, DialogueEngine,
    EngineSettings, OpenAiCompletion, Synthesizer, SystemClipboard, TextCompletion,
    WakeWordListener,
};

/// Pair Voice - hands-free pair programming assistant
#[derive(Parser)]
#[command(name = "pair-voice", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,pair_voice=info",
        1 => "info,pair_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&text).await,
        };
    }

    // Credentials are checked before any device is opened
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    let mut engine = build_engine(&config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            on_signal.cancel();
        }
    });

    if config.wake_word_enabled() {
        tracing::info!(wake_words = ?config.voice.wake_words, "pair voice ready - say the wake word");
    } else {
        tracing::info!("pair voice ready - press Enter to start talking");
    }

    engine.run(cancel).await;
    Ok(())
}

/// Wire real devices and services into an engine
fn build_engine(config: &Config) -> anyhow::Result<DialogueEngine> {
    let mut capture = AudioCapture::new()?;
    capture.start()?;
    let capture = Rc::new(capture);

    let wake: Box<dyn WakeWordListener> = match &config.api_keys.deepgram {
        Some(key) => {
            let stt = SpeechToText::new_deepgram(
                key.clone(),
                DEEPGRAM_WAKE_MODEL,
                config.request_timeout,
            )?;
            let mut listener = MicrophoneWakeWord::new(
                Rc::clone(&capture),
                stt,
                config.voice.wake_words.clone(),
                config.voice.silence_threshold,
            );
            listener.set_on_detect(|transcript| {
                tracing::debug!(transcript, "wake phrase heard");
            });
            Box::new(listener)
        }
        None => {
            tracing::warn!("wake word detection disabled, press Enter to start a session");
            Box::new(ManualWakeWord)
        }
    };

    let transcriber = SpeechToText::new_whisper(
        config.api_keys.openai.clone(),
        config.voice.stt_model.clone(),
        config.request_timeout,
    )?;
    let completion: Rc<dyn TextCompletion> = Rc::new(OpenAiCompletion::new(
        config.api_keys.openai.clone(),
        config.llm.model.clone(),
        config.request_timeout,
    )?);

    let caps = Capabilities {
        wake,
        input: Box::new(MicrophoneInput::new(capture)),
        transcriber: Box::new(transcriber),
        synthesizer: Box::new(build_speaker(config)?),
        classifier: Box::new(CompletionClassifier::new(Rc::clone(&completion))),
        completion,
        reviewer: Box::new(CodeRabbitReviewer::discover(
            config.review.command.as_deref(),
            config.review.timeout,
        )),
        clipboard: Box::new(SystemClipboard),
    };

    Ok(DialogueEngine::new(caps, EngineSettings::from_config(config)))
}

/// `ElevenLabs` when a key is configured, otherwise `OpenAI` speech
fn build_speaker(config: &Config) -> anyhow::Result<Speaker> {
    let tts = match &config.api_keys.elevenlabs {
        Some(key) => TextToSpeech::new_elevenlabs(
            key.clone(),
            ELEVENLABS_DEFAULT_VOICE,
            config.request_timeout,
        )?,
        None => TextToSpeech::new_openai(
            config.api_keys.openai.clone(),
            config.voice.tts_model.clone(),
            config.voice.tts_voice.clone(),
            config.voice.tts_speed,
            config.request_timeout,
        )?,
    };
    Ok(Speaker::new(tts, AudioPlayback::new()?))
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.drain();
        let energy = rms(&samples);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak(&samples),
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Try: pavucontrol (to check levels)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;
    let mut samples = test_tone(440.0);
    samples.extend(test_tone(440.0));

    let never = AtomicBool::new(false);
    playback.play(samples, &never).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test TTS through the configured synthesizer
async fn test_tts(text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load()?;
    let speaker = build_speaker(&config)?;

    println!("Synthesizing and playing...");
    speaker.speak(text).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
