//! Dialogue engine integration tests
//!
//! Conversations are driven end to end through scripted ports.

mod common;

use std::time::Duration;

use common::{Harness, ScriptedCompletion, StubReviewer, StubWake};
use pair_voice::prompt::speech;
use pair_voice::{
    ArtifactKind, AudioClip, Confirmation, Intent, Language, Outcome, ReviewStatus, SessionStatus,
    Step, TaskQueue,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn coding_completion() -> ScriptedCompletion {
    ScriptedCompletion::new()
        .classify_as("coding")
        .on("implementation steps", "1. Create file\n2. Implement function")
}

fn files_in(dir: &TempDir) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[tokio::test]
async fn test_hello_world_session() {
    let workspace = TempDir::new().unwrap();
    let replies = [
        "create a function to print hello world",
        "yes",
        "yes",
        "python",
        "yes",
        "no",
        "no",
    ];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, coding_completion()).build();

    let summaries = engine.run_session().await;

    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.request, "create a function to print hello world");
    assert_eq!(summary.intent, Some(Intent::Coding));
    assert_eq!(summary.todos, vec!["Create file", "Implement function"]);
    assert_eq!(summary.status, SessionStatus::Completed);
    assert_eq!(summary.iteration_count, 0);

    let code = &summary.artifacts[&ArtifactKind::GeneratedCode];
    assert!(code.content.contains("Hello, World!"));
    let path = code.path.as_ref().unwrap();
    assert_eq!(path.file_name().unwrap(), "hello_world.py");
    assert_eq!(std::fs::read_to_string(path).unwrap(), code.content);

    // Both todos land in the same file
    assert_eq!(files_in(&workspace).len(), 1);

    assert!(script.spoke(speech::GREETING));
    assert!(script.spoke("Step 1 is done: Create file. The code is in hello_world.py."));
    assert!(script.spoke("Step 2 is done: Implement function. The code is in hello_world.py."));
    assert_eq!(script.last_spoken().as_deref(), Some(speech::SIGN_OFF));
    assert_eq!(script.remaining_replies(), 0);

    assert_eq!(engine.session().step, Step::WakeWait);
    assert!(engine.session().raw_utterance.is_empty());
    assert_eq!(engine.session().status, SessionStatus::Idle);
}

#[tokio::test]
async fn test_language_named_in_request_skips_question() {
    let workspace = TempDir::new().unwrap();
    let replies = ["write hello world in rust", "yes", "yes", "no", "no", "no"];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, coding_completion()).build();

    let summaries = engine.run_session().await;

    let code = &summaries[0].artifacts[&ArtifactKind::GeneratedCode];
    assert!(code.path.as_ref().unwrap().ends_with("hello_world.rs"));
    assert!(code.content.contains("Hello, World!"));
    assert!(
        !script
            .spoken()
            .iter()
            .any(|s| s.starts_with("Which programming language"))
    );
}

#[tokio::test]
async fn test_stop_between_todos_finishes_early() {
    let workspace = TempDir::new().unwrap();
    let replies = ["write hello world in python", "yes", "yes", "no", "no", "no"];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, coding_completion()).build();

    let summaries = engine.run_session().await;

    assert!(script.spoke(speech::STOPPING_EARLY));
    assert!(!script.spoke("Step 2 is done: Implement function. The code is in hello_world.py."));
    assert_eq!(summaries[0].todos, vec!["Create file"]);
}

#[tokio::test]
async fn test_answer_after_pause_is_acted_on() {
    let workspace = TempDir::new().unwrap();
    let replies = [
        "write hello world in python",
        "yes",
        "yes",
        "hold on",
        "no",
        "no",
    ];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, coding_completion()).build();

    let summaries = engine.run_session().await;

    assert!(script.spoke(speech::WAITING));
    assert!(script.spoke("Ready when you are. Shall I go on with Implement function?"));
    assert!(script.spoke(speech::STOPPING_EARLY));
    assert!(!script.spoke("Step 2 is done: Implement function. The code is in hello_world.py."));
    assert_eq!(summaries[0].todos, vec!["Create file"]);
    assert_eq!(script.last_spoken().as_deref(), Some(speech::SIGN_OFF));
}

#[tokio::test]
async fn test_repeated_pauses_carry_on() {
    let workspace = TempDir::new().unwrap();
    let replies = [
        "write hello world in python",
        "yes",
        "yes",
        "hold on",
        "wait",
        "one moment",
        "no",
        "no",
    ];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, coding_completion()).build();

    let summaries = engine.run_session().await;

    assert_eq!(script.times_spoken(speech::WAITING), 2);
    assert!(script.spoke("Step 2 is done: Implement function. The code is in hello_world.py."));
    assert_eq!(summaries[0].todos, vec!["Create file", "Implement function"]);
    assert_eq!(summaries[0].status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_mentioned_data_format_still_asks_language() {
    let workspace = TempDir::new().unwrap();
    let replies = [
        "write a function that parses json",
        "yes",
        "yes",
        "python",
        "no",
        "no",
    ];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, coding_completion()).build();

    let summaries = engine.run_session().await;

    assert!(
        script
            .spoken()
            .iter()
            .any(|s| s.starts_with("Which programming language"))
    );
    let code = &summaries[0].artifacts[&ArtifactKind::GeneratedCode];
    let path = code.path.as_ref().unwrap();
    assert_eq!(path.extension().unwrap(), "py");
}

#[tokio::test]
async fn test_rejected_plan_writes_nothing() {
    let workspace = TempDir::new().unwrap();
    let replies = ["build a todo app", "yes", "no", "no"];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, coding_completion()).build();

    let summaries = engine.run_session().await;

    assert!(script.spoke(speech::PLAN_REJECTED));
    assert!(summaries[0].todos.is_empty());
    assert!(files_in(&workspace).is_empty());
}

#[tokio::test]
async fn test_rate_limited_review() {
    let workspace = TempDir::new().unwrap();
    let completion = ScriptedCompletion::new().classify_as("review");
    let mut harness = Harness::new(workspace.path(), &["review my code", "yes"], completion);
    harness.reviewer = StubReviewer::new(ReviewStatus::RateLimited, "Rate limit exceeded");
    let reviewed = std::rc::Rc::clone(&harness.reviewer.reviewed);
    let (mut engine, script) = harness.build();

    loop {
        let report = engine.step().await.unwrap();
        if report.from == Step::ReviewCode {
            assert_eq!(report.outcome, Outcome::Answered);
            assert_eq!(report.to, Step::RespondAndOfferMore);
            break;
        }
    }

    assert_eq!(engine.session().status, SessionStatus::RateLimited);
    assert_eq!(script.last_spoken().as_deref(), Some(speech::REVIEW_RATE_LIMITED));
    assert_eq!(reviewed.borrow().as_slice(), [workspace.path().to_path_buf()]);

    let summaries = engine.run_session().await;
    assert_eq!(summaries[0].status, SessionStatus::RateLimited);
    assert_eq!(
        summaries[0].artifacts[&ArtifactKind::Review].content,
        "Rate limit exceeded"
    );
}

#[tokio::test]
async fn test_completed_review_is_summarised() {
    let workspace = TempDir::new().unwrap();
    let completion = ScriptedCompletion::new()
        .classify_as("review")
        .on("Summarize this code review", "Two issues, the worst is an unchecked index.");
    let mut harness = Harness::new(workspace.path(), &["review my code", "yes", "no"], completion);
    harness.reviewer = StubReviewer::new(ReviewStatus::Completed, "issue 1\nissue 2");
    let (mut engine, script) = harness.build();

    let summaries = engine.run_session().await;

    assert!(script.spoke("Two issues, the worst is an unchecked index."));
    assert_eq!(summaries[0].status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_iteration_bound_holds() {
    let workspace = TempDir::new().unwrap();
    let replies = ["make it print the sum"];
    let mut harness = Harness::new(workspace.path(), &replies, ScriptedCompletion::new());
    harness.settings.max_iterations = 1;
    let (mut engine, script) = harness.build();

    let session = engine.session_mut();
    session.step = Step::CollectFeedback;
    session.status = SessionStatus::Active;
    session.raw_utterance = "write a function to add numbers".to_string();
    session.language = Some(Language::Python);
    session.task_queue = TaskQueue::new(vec!["Implement".to_string()]);
    session.task_queue.advance();

    let report = engine.step().await.unwrap();
    assert_eq!(report.outcome, Outcome::Feedback);
    assert_eq!(report.to, Step::IterateCode);

    let report = engine.step().await.unwrap();
    assert_eq!(report.outcome, Outcome::Iterated);
    assert_eq!(report.to, Step::RespondAndOfferMore);
    assert_eq!(engine.session().iteration_count, 1);
    assert!(script.spoke("I've saved the new version as main_function.py."));
    assert_eq!(script.times_spoken(speech::ANY_CHANGES), 1);
}

#[tokio::test]
async fn test_iterate_refused_at_limit() {
    let workspace = TempDir::new().unwrap();
    let mut harness = Harness::new(workspace.path(), &[], ScriptedCompletion::new());
    harness.settings.max_iterations = 2;
    let (mut engine, script) = harness.build();

    let session = engine.session_mut();
    session.step = Step::IterateCode;
    session.iteration_count = 2;
    session.feedback = Some("rename it".to_string());

    let report = engine.step().await.unwrap();
    assert_eq!(report.outcome, Outcome::LimitReached);
    assert_eq!(report.to, Step::RespondAndOfferMore);
    assert_eq!(engine.session().iteration_count, 2);
    assert!(files_in(&workspace).is_empty());
    assert!(script.spoken().is_empty());
}

#[tokio::test]
async fn test_iteration_writes_new_file_each_round() {
    let workspace = TempDir::new().unwrap();
    let replies = ["add a docstring", "also add type hints", "no"];
    let (mut engine, _script) = Harness::new(workspace.path(), &replies, ScriptedCompletion::new()).build();

    let session = engine.session_mut();
    session.step = Step::CollectFeedback;
    session.status = SessionStatus::Active;
    session.raw_utterance = "write a function to add numbers".to_string();
    session.language = Some(Language::Python);

    let summaries = engine.run_session().await;

    assert_eq!(summaries[0].iteration_count, 2);
    let mut names: Vec<String> = files_in(&workspace)
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["main_function.py", "main_function_2.py"]);
}

#[tokio::test]
async fn test_prompt_not_repeated_within_turn() {
    let workspace = TempDir::new().unwrap();
    let mut harness = Harness::new(workspace.path(), &[], ScriptedCompletion::new());
    harness.settings.capture_retries = 2;
    let (mut engine, script) = harness.build();
    engine.session_mut().step = Step::CaptureVoice;

    let first = engine.step().await.unwrap();
    assert_eq!(first.outcome, Outcome::Retry);
    assert_eq!(first.to, Step::CaptureVoice);
    let second = engine.step().await.unwrap();
    assert_eq!(second.outcome, Outcome::Retry);
    let third = engine.step().await.unwrap();
    assert_eq!(third.outcome, Outcome::GaveUp);
    assert_eq!(third.to, Step::WakeWait);

    assert_eq!(
        script.spoken(),
        vec![speech::NOTHING_HEARD, speech::GIVE_UP_LISTENING]
    );
    assert_eq!(script.captures(), 3);
}

#[tokio::test]
async fn test_no_consecutive_duplicate_prompts() {
    let workspace = TempDir::new().unwrap();
    let replies = [
        "create a function to print hello world",
        "yes",
        "",
        "",
        "banana",
        "python",
        "yes",
        "no",
        "",
        "",
    ];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, coding_completion()).build();

    engine.run_session().await;

    let spoken = script.spoken();
    for pair in spoken.windows(2) {
        assert_ne!(pair[0], pair[1], "repeated prompt in {spoken:?}");
    }
}

#[tokio::test]
async fn test_silent_confirmation_recaptures() {
    let workspace = TempDir::new().unwrap();
    let (mut engine, script) = Harness::new(workspace.path(), &[], ScriptedCompletion::new()).build();
    let session = engine.session_mut();
    session.step = Step::Confirm;
    session.raw_utterance = "write a test".to_string();

    let report = engine.step().await.unwrap();

    assert_eq!(report.outcome, Outcome::Denied);
    assert_eq!(report.to, Step::CaptureVoice);
    assert_eq!(engine.session().confirmed, Confirmation::Denied);
    assert!(engine.session().raw_utterance.is_empty());
    assert_eq!(
        script.spoken(),
        vec![
            "I heard: write a test. Is that correct?".to_string(),
            speech::STILL_THERE.to_string(),
            speech::SAY_AGAIN.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_denied_confirmation_recaptures() {
    let workspace = TempDir::new().unwrap();
    let replies = ["write a parser", "no", "write a lexer", "yes"];
    let completion = ScriptedCompletion::new().classify_as("discussion");
    let (mut engine, script) = Harness::new(workspace.path(), &replies, completion).build();
    engine.session_mut().step = Step::CaptureVoice;

    let steps = [
        (Step::CaptureVoice, Step::Transcribe),
        (Step::Transcribe, Step::Confirm),
        (Step::Confirm, Step::CaptureVoice),
        (Step::CaptureVoice, Step::Transcribe),
        (Step::Transcribe, Step::Confirm),
        (Step::Confirm, Step::ClassifyIntent),
    ];
    for (from, to) in steps {
        let report = engine.step().await.unwrap();
        assert_eq!((report.from, report.to), (from, to));
    }

    assert_eq!(engine.session().raw_utterance, "write a lexer");
    assert!(script.spoke(speech::SAY_AGAIN));
}

#[tokio::test]
async fn test_exit_phrase_ends_conversation() {
    let workspace = TempDir::new().unwrap();
    let completion = ScriptedCompletion::new();
    let (mut engine, script) =
        Harness::new(workspace.path(), &["Thank you, pair programming!"], completion).build();

    let summaries = engine.run_session().await;

    assert_eq!(summaries[0].intent, Some(Intent::Exit));
    assert_eq!(summaries[0].status, SessionStatus::Completed);
    assert_eq!(script.last_spoken().as_deref(), Some(speech::GOODBYE));
    assert!(
        !script
            .spoken()
            .iter()
            .any(|s| s.starts_with("I heard:"))
    );
}

#[tokio::test]
async fn test_discussion_then_more_help() {
    let workspace = TempDir::new().unwrap();
    let completion = ScriptedCompletion::new()
        .classify_as("discussion")
        .on("A developer asks", "A closure captures variables from its scope.");
    let replies = ["what is a closure", "yes", "yes", "what is a trait", "no"];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, completion).build();

    let summaries = engine.run_session().await;

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].request, "what is a closure");
    assert_eq!(summaries[0].intent, Some(Intent::Discussion));
    assert_eq!(
        summaries[0].artifacts[&ArtifactKind::Explanation].content,
        "A closure captures variables from its scope."
    );
    assert_eq!(summaries[1].request, "what is a trait");
    assert!(script.spoke(speech::NEXT_REQUEST));
    assert_eq!(script.last_spoken().as_deref(), Some(speech::SIGN_OFF));
}

#[tokio::test]
async fn test_empty_clipboard_analysis() {
    let workspace = TempDir::new().unwrap();
    let completion = ScriptedCompletion::new().classify_as("code_analysis");
    let replies = ["explain the code in my clipboard", "yes", "no"];
    let (mut engine, script) = Harness::new(workspace.path(), &replies, completion).build();

    let summaries = engine.run_session().await;

    assert!(script.spoke(speech::EMPTY_CLIPBOARD));
    assert_eq!(summaries[0].intent, Some(Intent::CodeAnalysis));
}

#[tokio::test]
async fn test_clipboard_code_is_analysed() {
    let workspace = TempDir::new().unwrap();
    let completion = ScriptedCompletion::new()
        .classify_as("code_analysis")
        .on("def add", "It adds two numbers.");
    let replies = ["explain the code in my clipboard", "yes", "no"];
    let mut harness = Harness::new(workspace.path(), &replies, completion);
    harness.clipboard = "def add(a, b):\n    return a + b\n".to_string();
    let (mut engine, script) = harness.build();

    let summaries = engine.run_session().await;

    assert!(script.spoke("It adds two numbers."));
    assert_eq!(
        summaries[0].artifacts[&ArtifactKind::Explanation].content,
        "It adds two numbers."
    );
}

#[tokio::test]
async fn test_failed_step_apologises_and_resets() {
    let workspace = TempDir::new().unwrap();
    let (mut engine, script) = Harness::new(workspace.path(), &[], ScriptedCompletion::new()).build();
    script.fail_transcription();
    let session = engine.session_mut();
    session.step = Step::Transcribe;
    session.status = SessionStatus::Active;
    session.pending_audio = Some(AudioClip::new(vec![0.2; 1600], common::RATE));

    let report = engine.step().await.unwrap();

    assert_eq!(report.outcome, Outcome::Failed);
    assert_eq!(report.to, Step::WakeWait);
    let summary = report.finished.unwrap();
    assert_eq!(summary.status, SessionStatus::Error);
    assert!(summary.error_message.unwrap().contains("service unavailable"));
    assert_eq!(script.spoken(), vec![speech::APOLOGY]);
    assert_eq!(engine.session().status, SessionStatus::Idle);
}

#[tokio::test]
async fn test_failed_answer_apologises() {
    let workspace = TempDir::new().unwrap();
    let completion = ScriptedCompletion::new().classify_as("explanation");
    let (mut engine, script) =
        Harness::new(workspace.path(), &["what is a monad", "yes"], completion).build();

    let summaries = engine.run_session().await;

    assert_eq!(summaries[0].status, SessionStatus::Error);
    assert_eq!(script.last_spoken().as_deref(), Some(speech::APOLOGY));
}

#[tokio::test]
async fn test_wake_timeout_ends_engine() {
    let workspace = TempDir::new().unwrap();
    let mut harness = Harness::new(workspace.path(), &[], ScriptedCompletion::new());
    harness.wake = StubWake::new(&[]);
    harness.settings.wake_timeout = Some(Duration::from_millis(10));
    let (mut engine, script) = harness.build();

    let report = engine.step().await.unwrap();
    assert_eq!(report.outcome, Outcome::WakeTimedOut);
    assert_eq!(report.to, Step::End);
    assert!(report.finished.is_none());
    assert!(engine.step().await.is_none());
    assert!(script.spoken().is_empty());
}

#[tokio::test]
async fn test_run_stops_when_cancelled() {
    let workspace = TempDir::new().unwrap();
    let (mut engine, script) = Harness::new(workspace.path(), &[], ScriptedCompletion::new()).build();

    let cancel = CancellationToken::new();
    cancel.cancel();
    engine.run(cancel).await;

    assert_eq!(script.stops(), 1);
    assert!(script.spoken().is_empty());
    assert_eq!(engine.session().step, Step::WakeWait);
}

#[tokio::test]
async fn test_cancel_interrupts_step_in_flight() {
    let workspace = TempDir::new().unwrap();
    let (mut engine, script) =
        Harness::new(workspace.path(), &["write a test"], ScriptedCompletion::new()).build();
    script.stall_speech();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let watcher = std::rc::Rc::clone(&script);
    tokio::join!(engine.run(cancel), async move {
        while watcher.spoken().is_empty() {
            tokio::task::yield_now().await;
        }
        trigger.cancel();
    });

    assert_eq!(script.stops(), 1);
    assert_eq!(script.spoken(), vec![speech::GREETING]);
    assert_eq!(script.captures(), 0);
    assert_eq!(engine.session().step, Step::WakeWait);
    assert_eq!(script.remaining_replies(), 1);
}

#[tokio::test]
async fn test_run_serves_until_end() {
    let workspace = TempDir::new().unwrap();
    let completion = ScriptedCompletion::new()
        .classify_as("discussion")
        .on("A developer asks", "Sure.");
    let mut harness = Harness::new(workspace.path(), &["hello there", "yes", "no"], completion);
    harness.wake = StubWake::new(&[true]);
    harness.settings.wake_timeout = Some(Duration::from_millis(10));
    let (mut engine, script) = harness.build();

    engine.run(CancellationToken::new()).await;

    assert_eq!(engine.session().step, Step::End);
    assert!(script.spoke("Sure."));
    assert_eq!(script.stops(), 0);
}
