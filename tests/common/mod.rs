//! Shared test utilities: scripted ports and an engine harness

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use pair_voice::{
    AudioClip, AudioInput, Capabilities, Clipboard, CompletionClassifier, CompletionOptions,
    DialogueEngine, EngineSettings, Error, ExternalReviewer, Result, ReviewReport, ReviewStatus,
    Synthesizer, TextCompletion, Transcriber, WakeWordListener,
};

/// Sample rate of scripted clips
pub const RATE: u32 = 16_000;

/// What the user says, in order, plus everything the assistant said back
///
/// Each capture consumes one reply. An empty reply, or running out of
/// replies, is silence.
#[derive(Default)]
pub struct Script {
    replies: RefCell<VecDeque<String>>,
    pending: RefCell<VecDeque<String>>,
    spoken: RefCell<Vec<String>>,
    captures: Cell<usize>,
    stops: Cell<usize>,
    fail_transcription: Cell<bool>,
    stall_speech: Cell<bool>,
}

impl Script {
    pub fn new(replies: &[&str]) -> Rc<Self> {
        let script = Self::default();
        script
            .replies
            .borrow_mut()
            .extend(replies.iter().map(ToString::to_string));
        Rc::new(script)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.borrow().clone()
    }

    pub fn spoke(&self, text: &str) -> bool {
        self.spoken.borrow().iter().any(|s| s == text)
    }

    pub fn times_spoken(&self, text: &str) -> usize {
        self.spoken.borrow().iter().filter(|s| *s == text).count()
    }

    pub fn last_spoken(&self) -> Option<String> {
        self.spoken.borrow().last().cloned()
    }

    pub fn captures(&self) -> usize {
        self.captures.get()
    }

    pub fn stops(&self) -> usize {
        self.stops.get()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.borrow().len()
    }

    pub fn fail_transcription(&self) {
        self.fail_transcription.set(true);
    }

    /// Playback never finishes once it starts, until stopped from outside
    pub fn stall_speech(&self) {
        self.stall_speech.set(true);
    }
}

/// Microphone that "hears" the next scripted reply
pub struct ScriptedInput(pub Rc<Script>);

#[async_trait(?Send)]
impl AudioInput for ScriptedInput {
    async fn capture_until_silence(&self, _max: Duration, _threshold: f32) -> Result<AudioClip> {
        self.0.captures.set(self.0.captures.get() + 1);
        let reply = self.0.replies.borrow_mut().pop_front().unwrap_or_default();
        if reply.is_empty() {
            return Ok(AudioClip::silence(RATE));
        }
        self.0.pending.borrow_mut().push_back(reply);
        Ok(AudioClip::new(vec![0.2; 1600], RATE))
    }
}

/// Transcribes clips produced by [`ScriptedInput`]
pub struct ScriptedTranscriber(pub Rc<Script>);

#[async_trait(?Send)]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _clip: &AudioClip) -> Result<String> {
        if self.0.fail_transcription.get() {
            return Err(Error::Stt("service unavailable".to_string()));
        }
        Ok(self.0.pending.borrow_mut().pop_front().unwrap_or_default())
    }
}

/// Records what would have been spoken
pub struct RecordingSynth(pub Rc<Script>);

#[async_trait(?Send)]
impl Synthesizer for RecordingSynth {
    async fn speak(&self, text: &str) -> Result<()> {
        self.0.spoken.borrow_mut().push(text.to_string());
        if self.0.stall_speech.get() {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn stop(&self) {
        self.0.stops.set(self.0.stops.get() + 1);
    }
}

/// Answers prompts containing a needle with a canned reply
///
/// Prompts matching no rule fail, which exercises every fallback path.
#[derive(Default)]
pub struct ScriptedCompletion {
    rules: Vec<(String, String)>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }

    /// Classify every request as `intent`
    #[must_use]
    pub fn classify_as(self, intent: &str) -> Self {
        let verdict = format!(
            r#"{{"intent": "{intent}", "confidence": 0.9, "action": "test", "message": "ok"}}"#
        );
        self.on("Classify this request", &verdict)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        self.calls.borrow_mut().push(prompt.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| Error::Completion("no scripted reply".to_string()))
    }
}

/// Reviewer returning a fixed report
pub struct StubReviewer {
    pub status: ReviewStatus,
    pub output: String,
    pub reviewed: Rc<RefCell<Vec<PathBuf>>>,
}

impl StubReviewer {
    pub fn new(status: ReviewStatus, output: &str) -> Self {
        Self {
            status,
            output: output.to_string(),
            reviewed: Rc::default(),
        }
    }
}

#[async_trait(?Send)]
impl ExternalReviewer for StubReviewer {
    async fn review_directory(&self, dir: &Path) -> ReviewReport {
        self.reviewed.borrow_mut().push(dir.to_path_buf());
        ReviewReport::new(self.status, self.output.clone())
    }
}

/// Wake listener with scripted detections; false once exhausted
pub struct StubWake(pub RefCell<VecDeque<bool>>);

impl StubWake {
    pub fn new(detections: &[bool]) -> Self {
        Self(RefCell::new(detections.iter().copied().collect()))
    }
}

#[async_trait(?Send)]
impl WakeWordListener for StubWake {
    async fn listen(&self, _timeout: Option<Duration>) -> Result<bool> {
        Ok(self.0.borrow_mut().pop_front().unwrap_or(false))
    }
}

/// Clipboard holding fixed text
pub struct StubClipboard(pub String);

#[async_trait(?Send)]
impl Clipboard for StubClipboard {
    async fn read(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Everything needed to build an engine over scripted ports
pub struct Harness {
    pub script: Rc<Script>,
    pub completion: Rc<ScriptedCompletion>,
    pub reviewer: StubReviewer,
    pub wake: StubWake,
    pub clipboard: String,
    pub settings: EngineSettings,
}

impl Harness {
    pub fn new(workspace: &Path, replies: &[&str], completion: ScriptedCompletion) -> Self {
        Self {
            script: Script::new(replies),
            completion: Rc::new(completion),
            reviewer: StubReviewer::new(ReviewStatus::Completed, ""),
            wake: StubWake::new(&[true]),
            clipboard: String::new(),
            settings: EngineSettings::new(workspace),
        }
    }

    pub fn build(self) -> (DialogueEngine, Rc<Script>) {
        let completion: Rc<dyn TextCompletion> = self.completion;
        let caps = Capabilities {
            wake: Box::new(self.wake),
            input: Box::new(ScriptedInput(Rc::clone(&self.script))),
            transcriber: Box::new(ScriptedTranscriber(Rc::clone(&self.script))),
            synthesizer: Box::new(RecordingSynth(Rc::clone(&self.script))),
            classifier: Box::new(CompletionClassifier::new(Rc::clone(&completion))),
            completion,
            reviewer: Box::new(self.reviewer),
            clipboard: Box::new(StubClipboard(self.clipboard)),
        };
        (DialogueEngine::new(caps, self.settings), self.script)
    }
}
