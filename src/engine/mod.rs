//! The dialogue engine
//!
//! A single actor walks the state graph one step at a time. Each step runs
//! the current state's handler, feeds its [`Outcome`] through
//! [`next_step`], and applies the session resets that belong to the edge:
//! a full reset on entering `WakeWait` and a task reset when the user asks
//! for more help. Handler errors stop at the step boundary. They are
//! recorded, apologised for, and the conversation returns to idle.

mod steps;
mod transition;

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::classify::{Classifier, Language};
use crate::config::{Config, SessionConfig, VoiceConfig};
use crate::policy::Turn;
use crate::ports::{
    AudioInput, Clipboard, ExternalReviewer, Synthesizer, TextCompletion, Transcriber,
    WakeWordListener,
};
use crate::prompt::speech;
use crate::session::{Session, SessionStatus, SessionSummary, Step};

pub use transition::{Outcome, next_step, route};

/// The ports the engine drives
pub struct Capabilities {
    pub wake: Box<dyn WakeWordListener>,
    pub input: Box<dyn AudioInput>,
    pub transcriber: Box<dyn Transcriber>,
    pub synthesizer: Box<dyn Synthesizer>,
    /// Shared with completion-backed classifiers
    pub completion: Rc<dyn TextCompletion>,
    pub classifier: Box<dyn Classifier>,
    pub reviewer: Box<dyn ExternalReviewer>,
    pub clipboard: Box<dyn Clipboard>,
}

/// Timing and policy knobs
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub wake_timeout: Option<Duration>,
    pub utterance_window: Duration,
    pub response_window: Duration,
    pub silence_threshold: f32,
    pub max_iterations: u32,
    pub ambiguous_retries: u32,
    pub silent_retries: u32,
    pub capture_retries: u32,
    pub default_language: Language,
    pub discuss_each_step: bool,
    pub temperature: f32,
    pub workspace_dir: PathBuf,
}

impl EngineSettings {
    /// Built-in defaults, writing into `workspace_dir`
    #[must_use]
    pub fn new(workspace_dir: impl Into<PathBuf>) -> Self {
        Self::from_parts(
            &VoiceConfig::default(),
            &SessionConfig::default(),
            0.3,
            workspace_dir.into(),
        )
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::from_parts(
            &config.voice,
            &config.session,
            config.llm.temperature,
            config.workspace_dir.clone(),
        )
    }

    fn from_parts(
        voice: &VoiceConfig,
        session: &SessionConfig,
        temperature: f32,
        workspace_dir: PathBuf,
    ) -> Self {
        let default_language = Language::from_name(&session.default_language).unwrap_or_else(|| {
            tracing::warn!(
                language = %session.default_language,
                "unsupported default language, using python"
            );
            Language::Python
        });

        Self {
            wake_timeout: voice.wake_timeout,
            utterance_window: voice.utterance_window,
            response_window: voice.response_window,
            silence_threshold: voice.silence_threshold,
            max_iterations: session.max_iterations.max(1),
            ambiguous_retries: session.ambiguous_retries,
            silent_retries: session.silent_retries,
            capture_retries: session.capture_retries,
            default_language,
            discuss_each_step: session.discuss_each_step,
            temperature,
            workspace_dir,
        }
    }
}

/// Ports and settings handed to every handler
struct Context {
    caps: Capabilities,
    settings: EngineSettings,
}

impl Context {
    fn turn(&self) -> Turn<'_> {
        Turn::new(
            self.caps.synthesizer.as_ref(),
            self.caps.input.as_ref(),
            self.caps.transcriber.as_ref(),
            self.settings.silence_threshold,
            self.settings.response_window,
        )
    }
}

/// What one step did
#[derive(Debug, Clone)]
pub struct StepReport {
    pub from: Step,
    pub outcome: Outcome,
    pub to: Step,
    /// Snapshot taken when the step reset the session
    pub finished: Option<SessionSummary>,
}

/// Drives a voice conversation through the state graph
pub struct DialogueEngine {
    ctx: Context,
    session: Session,
}

impl DialogueEngine {
    #[must_use]
    pub fn new(caps: Capabilities, settings: EngineSettings) -> Self {
        let session = Session::new(settings.max_iterations);
        Self {
            ctx: Context { caps, settings },
            session,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access for seeding a conversation mid-graph
    pub const fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.ctx.settings
    }

    /// Run the current state and move to the next one
    ///
    /// Returns `None` once the engine has reached `End`.
    pub async fn step(&mut self) -> Option<StepReport> {
        let Self { ctx, session } = self;
        let from = session.step;
        if from == Step::End {
            return None;
        }

        let outcome = if from == Step::IterateCode && !session.can_iterate() {
            tracing::warn!(
                iterations = session.iteration_count,
                "refinement limit reached, not iterating"
            );
            Outcome::LimitReached
        } else {
            match steps::dispatch(ctx, session).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(step = %from, error = %e, "step failed");
                    session.error_message = Some(e.to_string());
                    session.status = SessionStatus::Error;
                    if let Err(e) = ctx.turn().say(session, speech::APOLOGY).await {
                        tracing::warn!(error = %e, "failed to apologise");
                    }
                    Outcome::Failed
                }
            }
        };

        let to = next_step(from, &outcome, session);
        tracing::info!(from = %from, to = %to, ?outcome, "transition");

        let finished = if to == Step::WakeWait && from != Step::WakeWait {
            let summary = session.summary();
            session.reset();
            Some(summary)
        } else if from == Step::RespondAndOfferMore && to == Step::ClassifyIntent {
            let summary = session.summary();
            session.reset_task();
            Some(summary)
        } else {
            None
        };

        if to != from {
            session.end_turn();
        }
        session.step = to;

        Some(StepReport {
            from,
            outcome,
            to,
            finished,
        })
    }

    /// Step until the conversation returns to idle or the engine ends
    ///
    /// Returns a summary for every task the conversation finished.
    pub async fn run_session(&mut self) -> Vec<SessionSummary> {
        let mut summaries = Vec::new();
        while let Some(report) = self.step().await {
            summaries.extend(report.finished);
            if matches!(report.to, Step::WakeWait | Step::End) {
                break;
            }
        }
        summaries
    }

    /// Serve conversations until `End` or cancellation
    ///
    /// Cancellation drops the step in flight, so its transition is never
    /// applied, and interrupts any playback.
    pub async fn run(&mut self, cancel: CancellationToken) {
        tracing::info!("dialogue engine started");
        loop {
            let report = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(step = %self.session.step, "cancelled");
                    self.ctx.caps.synthesizer.stop();
                    break;
                }
                report = self.step() => report,
            };

            match report {
                None => break,
                Some(report) => {
                    if let Some(summary) = report.finished {
                        tracing::info!(
                            intent = summary.intent.map(|i| i.as_str()),
                            status = summary.status.as_str(),
                            iterations = summary.iteration_count,
                            "conversation finished"
                        );
                    }
                    if report.to == Step::End {
                        break;
                    }
                }
            }
        }
        tracing::info!("dialogue engine stopped");
    }
}
