//! State handlers
//!
//! Each handler performs one state's turn against the session and reports
//! what happened. Transitions are decided elsewhere.

use std::path::Path;

use super::Context;
use super::transition::Outcome;
use crate::classify::{
    Language, detect_answered_language, detect_requested_language, is_exit_phrase,
};
use crate::policy::{Clarified, ConfirmPolicy, ResponseCategory, Turn, clarify, clarify_with};
use crate::prompt::speech;
use crate::session::{ArtifactKind, Confirmation, Intent, Session, SessionStatus, Step, TaskQueue};
use crate::tasks::{self, CodeRequest, FileOperation, GeneratedCode, Workspace, review};
use crate::{Error, Result, artifacts, policy};

/// Rounds of language clarification before the default applies
const LANGUAGE_ROUNDS: u32 = 3;

/// Re-asks allowed when a between-todos answer is unclear
const STEP_ROUNDS: u32 = 2;

/// Waits granted between todos before carrying on regardless
const MAX_PAUSES: u32 = 2;

pub(super) async fn dispatch(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    match session.step {
        Step::WakeWait => wake_wait(ctx, session).await,
        Step::CaptureVoice => capture_voice(ctx, session).await,
        Step::Transcribe => transcribe(ctx, session).await,
        Step::Confirm => confirm(ctx, session).await,
        Step::ClassifyIntent => classify_intent(ctx, session).await,
        Step::GenerateTodos => generate_todos(ctx, session).await,
        Step::GenerateCode => generate_code(ctx, session).await,
        Step::CheckTodoCompletion => check_todo_completion(ctx, session).await,
        Step::CollectFeedback => collect_feedback(ctx, session).await,
        Step::IterateCode => iterate_code(ctx, session).await,
        Step::ExplainCode => explain_code(ctx, session).await,
        Step::ReviewCode => review_code(ctx, session).await,
        Step::RespondAndOfferMore => respond_and_offer_more(ctx, session).await,
        Step::End => Ok(Outcome::Stop),
    }
}

async fn wake_wait(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    tracing::info!("waiting for wake word");
    if !ctx.caps.wake.listen(ctx.settings.wake_timeout).await? {
        tracing::info!("no wake word before timeout");
        return Ok(Outcome::WakeTimedOut);
    }

    session.status = SessionStatus::Active;
    ctx.turn().say(session, speech::GREETING).await?;
    Ok(Outcome::WakeDetected)
}

async fn capture_voice(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let clip = ctx
        .caps
        .input
        .capture_until_silence(ctx.settings.utterance_window, ctx.settings.silence_threshold)
        .await?;

    if clip.is_empty() {
        let turn = ctx.turn();
        if session.capture_attempts < ctx.settings.capture_retries {
            session.capture_attempts += 1;
            turn.say(session, speech::NOTHING_HEARD).await?;
            return Ok(Outcome::Retry);
        }
        turn.say(session, speech::GIVE_UP_LISTENING).await?;
        return Ok(Outcome::GaveUp);
    }

    tracing::debug!(duration = ?clip.duration(), "request captured");
    session.capture_attempts = 0;
    session.pending_audio = Some(clip);
    Ok(Outcome::Captured)
}

async fn transcribe(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let Some(clip) = session.pending_audio.take() else {
        return Ok(Outcome::NothingTranscribed);
    };

    let text = ctx.caps.transcriber.transcribe(&clip).await?;
    let text = text.trim();
    if text.is_empty() {
        ctx.turn().say(session, speech::DIDNT_CATCH).await?;
        return Ok(Outcome::NothingTranscribed);
    }

    tracing::info!(utterance = %text, "request transcribed");
    session.raw_utterance = text.to_string();
    session.confirmed = Confirmation::Pending;
    Ok(Outcome::Transcribed)
}

async fn confirm(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    // Saying goodbye needs no read-back
    if is_exit_phrase(&session.raw_utterance) {
        session.confirmed = Confirmation::Affirmed;
        return Ok(Outcome::Affirmed);
    }

    let turn = ctx.turn();
    let question = format!("I heard: {}. Is that correct?", session.raw_utterance);
    let policy = ConfirmPolicy::strict(ctx.settings.ambiguous_retries, ctx.settings.silent_retries);
    let verdict = policy.confirm(&turn, session, &question).await?;
    session.confirmed = verdict;

    if verdict == Confirmation::Affirmed {
        return Ok(Outcome::Affirmed);
    }
    session.raw_utterance.clear();
    turn.say(session, speech::SAY_AGAIN).await?;
    Ok(Outcome::Denied)
}

async fn classify_intent(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let turn = ctx.turn();

    if session.raw_utterance.trim().is_empty() {
        turn.ask(session, speech::NEXT_REQUEST).await?;
        match turn.listen(session, ctx.settings.utterance_window).await? {
            Some(request) => session.raw_utterance = request,
            None => {
                turn.say(session, speech::GIVE_UP_LISTENING).await?;
                return Ok(Outcome::NoRequest);
            }
        }
    }

    let verdict = ctx.caps.classifier.classify(&session.raw_utterance).await;
    tracing::info!(
        intent = verdict.intent.as_str(),
        confidence = verdict.confidence,
        action = %verdict.action,
        "request classified"
    );
    session.intent = Some(verdict.intent);

    if verdict.intent == Intent::Exit {
        session.status = SessionStatus::Completed;
        turn.say(session, speech::GOODBYE).await?;
    }
    Ok(Outcome::Classified(verdict.intent))
}

async fn generate_todos(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let turn = ctx.turn();
    let request = session.raw_utterance.clone();

    let todos = tasks::plan_todos(ctx.caps.completion.as_ref(), &request).await;
    tracing::info!(count = todos.len(), "planned todos");
    session.task_queue = TaskQueue::new(todos);

    turn.say(session, &tasks::plan_summary(session.task_queue.todos()))
        .await?;
    let approval = ConfirmPolicy::permissive(ctx.settings.ambiguous_retries, ctx.settings.silent_retries)
        .confirm(&turn, session, "Shall I go ahead with this plan?")
        .await?;
    if approval == Confirmation::Denied {
        session.task_queue = TaskQueue::default();
        turn.say(session, speech::PLAN_REJECTED).await?;
        return Ok(Outcome::PlanRejected);
    }

    let language = match detect_requested_language(&request) {
        Some(language) => language,
        None => choose_language(ctx, &turn, session).await?,
    };
    tracing::info!(language = language.key(), "target language");
    session.language = Some(language);
    Ok(Outcome::PlanAccepted)
}

/// Ask which language to write in
async fn choose_language(ctx: &Context, turn: &Turn<'_>, session: &mut Session) -> Result<Language> {
    let default = ctx.settings.default_language;
    let mut question = format!(
        "Which programming language should I use? I'll go with {default} if you don't mind."
    );

    for _ in 0..LANGUAGE_ROUNDS {
        let reply = clarify_with(turn, session, &question, LANGUAGE_ROUNDS, |answer| {
            detect_answered_language(answer).is_some()
        })
        .await?;

        match reply {
            Clarified::Accepted(text) => {
                return Ok(detect_answered_language(&text).unwrap_or(default));
            }
            Clarified::Silent
            | Clarified::Unclear(_)
            | Clarified::Answer {
                category: ResponseCategory::Yes,
                ..
            } => return Ok(default),
            Clarified::Answer {
                category: ResponseCategory::Help,
                ..
            } => {
                let names: Vec<&str> = Language::ALL.iter().map(|l| l.display_name()).collect();
                question = format!(
                    "I can write {}. Which one would you like?",
                    names.join(", ")
                );
            }
            Clarified::Answer {
                category: ResponseCategory::No | ResponseCategory::Change,
                ..
            } => question = "Which language would you prefer instead?".to_string(),
            Clarified::Answer {
                category: ResponseCategory::Pause,
                ..
            } => {
                turn.say(session, speech::WAITING).await?;
                question = "Just tell me the language when you're ready.".to_string();
            }
        }
    }

    Ok(default)
}

async fn generate_code(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let turn = ctx.turn();
    let language = session.language.unwrap_or(ctx.settings.default_language);
    let queue = &session.task_queue;
    let step_number = queue.cursor() + 1;
    let todo = queue.current().map(ToString::to_string);
    let todos = queue.todos()[..step_number.min(queue.len())].to_vec();
    let request = session.raw_utterance.clone();
    let notes = session.step_notes.clone();
    let previous = session
        .artifact(ArtifactKind::GeneratedCode)
        .map(|a| (a.content.clone(), a.path.clone()));

    if let Some(todo) = &todo {
        tracing::info!(step = step_number, todo = %todo, "implementing todo");
    }

    let code = tasks::draft_code(
        ctx.caps.completion.as_ref(),
        &CodeRequest {
            request: &request,
            todos: &todos,
            language,
            notes: &notes,
            previous: previous.as_ref().map(|(content, _)| content.as_str()),
            feedback: None,
        },
        ctx.settings.temperature,
    )
    .await;

    let path = match previous.and_then(|(_, path)| path) {
        Some(path) => {
            artifacts::rewrite(&path, &code.source)?;
            path
        }
        None => artifacts::write_new(&ctx.settings.workspace_dir, &code.filename, &code.source)?,
    };
    let filename = file_label(&path, &code);
    session.set_artifact(ArtifactKind::GeneratedCode, code.source, Some(path));
    session.task_queue.advance();

    let message = match todo {
        Some(todo) => format!("Step {step_number} is done: {todo}. The code is in {filename}."),
        None => format!("The code is in {filename}."),
    };
    turn.say(session, &message).await?;
    Ok(Outcome::CodeWritten)
}

fn file_label(path: &Path, code: &GeneratedCode) -> String {
    path.file_name().map_or_else(
        || code.filename.clone(),
        |name| name.to_string_lossy().into_owned(),
    )
}

async fn check_todo_completion(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let Some(next) = session.task_queue.current().map(ToString::to_string) else {
        tracing::info!("all todos done");
        return Ok(Outcome::Stop);
    };
    if !ctx.settings.discuss_each_step {
        return Ok(Outcome::Continue);
    }

    let turn = ctx.turn();
    let mut question = format!("Next up: {next}. Shall I continue?");
    let mut pauses = 0;
    let category = loop {
        let reply = clarify(&turn, session, &question, STEP_ROUNDS).await?;
        let Clarified::Answer { category, .. } = reply else {
            return Ok(Outcome::Continue);
        };
        if category != ResponseCategory::Pause || pauses == MAX_PAUSES {
            break category;
        }

        pauses += 1;
        tracing::debug!(pauses, "user paused between todos");
        turn.say(session, speech::WAITING).await?;
        question = format!("Ready when you are. Shall I go on with {next}?");
    };

    match category {
        ResponseCategory::Yes => {}
        ResponseCategory::No => {
            session.task_queue.drop_remaining();
            turn.say(session, speech::STOPPING_EARLY).await?;
            return Ok(Outcome::Stop);
        }
        ResponseCategory::Change => {
            turn.ask(session, speech::WHAT_TO_CHANGE).await?;
            if let Some(note) = turn.listen(session, ctx.settings.utterance_window).await? {
                tracing::info!(note = %note, "adjustment noted");
                session.step_notes.push(note);
            }
        }
        ResponseCategory::Help => {
            let remaining = session.task_queue.todos()[session.task_queue.cursor()..].join(", then ");
            let explanation = format!("Here's what's left: {remaining}. I'll carry on now.");
            turn.say(session, &explanation).await?;
        }
        ResponseCategory::Pause => {
            tracing::info!("still paused, carrying on");
        }
    }
    Ok(Outcome::Continue)
}

async fn collect_feedback(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let turn = ctx.turn();
    if !session.can_iterate() {
        turn.say(session, speech::ITERATION_LIMIT).await?;
        return Ok(Outcome::LimitReached);
    }

    match policy::collect_feedback(&turn, session, speech::ANY_CHANGES).await? {
        Some(feedback) => {
            tracing::info!(feedback = %feedback, "feedback received");
            session.feedback = Some(feedback);
            Ok(Outcome::Feedback)
        }
        None => Ok(Outcome::NoFeedback),
    }
}

async fn iterate_code(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let turn = ctx.turn();
    let feedback = session.feedback.take().unwrap_or_default();
    session.iteration_count += 1;
    tracing::info!(
        iteration = session.iteration_count,
        max = session.max_iterations,
        "refining code"
    );
    turn.say(session, "Okay, updating the code.").await?;

    let language = session.language.unwrap_or(ctx.settings.default_language);
    let request = session.raw_utterance.clone();
    let todos = session.task_queue.todos().to_vec();
    let notes = session.step_notes.clone();
    let previous = session
        .artifact(ArtifactKind::GeneratedCode)
        .map(|a| a.content.clone());

    let code = tasks::draft_code(
        ctx.caps.completion.as_ref(),
        &CodeRequest {
            request: &request,
            todos: &todos,
            language,
            notes: &notes,
            previous: previous.as_deref(),
            feedback: Some(&feedback),
        },
        ctx.settings.temperature,
    )
    .await;

    let path = artifacts::write_new(&ctx.settings.workspace_dir, &code.filename, &code.source)?;
    let filename = file_label(&path, &code);
    session.set_artifact(ArtifactKind::GeneratedCode, code.source, Some(path));
    turn.say(session, &format!("I've saved the new version as {filename}."))
        .await?;
    Ok(Outcome::Iterated)
}

async fn explain_code(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let request = session.raw_utterance.clone();
    let completion = ctx.caps.completion.as_ref();

    let answer = match session.intent {
        Some(Intent::CodeAnalysis) => {
            tasks::analyze_clipboard(ctx.caps.clipboard.as_ref(), completion, &request).await?
        }
        Some(Intent::FileOperations) => {
            let workspace = Workspace::new(&ctx.settings.workspace_dir);
            match workspace.perform(&FileOperation::from_request(&request)).await {
                Ok(answer) => answer,
                Err(Error::Workspace(reason)) => {
                    tracing::warn!(reason = %reason, "file request refused");
                    "I can only work with files inside the project folder.".to_string()
                }
                Err(e) => return Err(e),
            }
        }
        _ => tasks::discuss(completion, &request).await?,
    };

    session.set_artifact(ArtifactKind::Explanation, answer.clone(), None);
    session.status = SessionStatus::Completed;
    ctx.turn().say(session, &answer).await?;
    Ok(Outcome::Answered)
}

async fn review_code(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    let turn = ctx.turn();
    turn.say(session, speech::REVIEW_STARTED).await?;

    let report = tasks::run_review(
        ctx.caps.reviewer.as_ref(),
        ctx.caps.completion.as_ref(),
        &ctx.settings.workspace_dir,
    )
    .await;
    session.status = review::session_status(report.status);

    let message = tasks::spoken_message(&report);
    session.set_artifact(ArtifactKind::Review, report.output, None);
    turn.say(session, &message).await?;
    Ok(Outcome::Answered)
}

async fn respond_and_offer_more(ctx: &Context, session: &mut Session) -> Result<Outcome> {
    if session.status == SessionStatus::Active {
        session.status = SessionStatus::Completed;
    }

    let turn = ctx.turn();
    let policy = ConfirmPolicy::strict(ctx.settings.ambiguous_retries, ctx.settings.silent_retries);
    match policy.confirm(&turn, session, speech::ANYTHING_ELSE).await? {
        Confirmation::Affirmed => Ok(Outcome::MoreHelp),
        Confirmation::Denied | Confirmation::Pending => {
            turn.say(session, speech::SIGN_OFF).await?;
            Ok(Outcome::Declined)
        }
    }
}
