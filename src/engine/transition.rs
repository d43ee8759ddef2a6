//! The dialogue transition table

use crate::session::{Intent, Session, Step};

/// What a state handler observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    WakeDetected,
    WakeTimedOut,
    /// Speech was recorded
    Captured,
    /// Nothing recorded, try again
    Retry,
    /// Nothing recorded after every retry
    GaveUp,
    Transcribed,
    NothingTranscribed,
    Affirmed,
    Denied,
    Classified(Intent),
    /// No new request could be captured
    NoRequest,
    PlanAccepted,
    PlanRejected,
    CodeWritten,
    /// Carry on with the next todo
    Continue,
    /// No more todos, either finished or dropped
    Stop,
    Feedback,
    NoFeedback,
    Iterated,
    /// The refinement bound was hit
    LimitReached,
    /// An answer or review was delivered
    Answered,
    MoreHelp,
    Declined,
    /// The handler failed; already apologised for
    Failed,
}

/// Pick the next state
///
/// Conditions that depend on counters read them from `session` after the
/// handler has updated it.
#[must_use]
pub fn next_step(step: Step, outcome: &Outcome, session: &Session) -> Step {
    use Outcome as O;
    use Step as S;

    match (step, outcome) {
        (S::End, _) => S::End,
        // A broken wake listener can't recover by itself
        (S::WakeWait, O::Failed) => S::End,
        (_, O::Failed) => S::WakeWait,

        (S::WakeWait, O::WakeDetected) => S::CaptureVoice,
        (S::WakeWait, O::WakeTimedOut) => S::End,

        (S::CaptureVoice, O::Captured) => S::Transcribe,
        (S::CaptureVoice, O::Retry) => S::CaptureVoice,
        (S::CaptureVoice, O::GaveUp) => S::WakeWait,

        (S::Transcribe, O::Transcribed) => S::Confirm,
        (S::Transcribe, O::NothingTranscribed) => S::CaptureVoice,

        (S::Confirm, O::Affirmed) => S::ClassifyIntent,
        (S::Confirm, O::Denied) => S::CaptureVoice,

        (S::ClassifyIntent, O::Classified(intent)) => route(*intent),
        (S::ClassifyIntent, O::NoRequest) => S::WakeWait,

        (S::GenerateTodos, O::PlanAccepted) => S::GenerateCode,
        (S::GenerateTodos, O::PlanRejected) => S::RespondAndOfferMore,

        (S::GenerateCode, O::CodeWritten) => {
            if session.can_iterate() && !session.task_queue.is_complete() {
                S::CheckTodoCompletion
            } else {
                S::CollectFeedback
            }
        }

        (S::CheckTodoCompletion, O::Continue) if !session.task_queue.is_complete() => {
            S::GenerateCode
        }
        (S::CheckTodoCompletion, O::Continue | O::Stop) => S::RespondAndOfferMore,

        (S::CollectFeedback, O::Feedback) if session.can_iterate() => S::IterateCode,
        (S::CollectFeedback, O::Feedback | O::NoFeedback | O::LimitReached) => {
            S::RespondAndOfferMore
        }

        (S::IterateCode, O::Iterated) if session.can_iterate() => S::CollectFeedback,
        (S::IterateCode, O::Iterated | O::LimitReached) => S::RespondAndOfferMore,

        (S::ExplainCode | S::ReviewCode, O::Answered) => S::RespondAndOfferMore,

        (S::RespondAndOfferMore, O::MoreHelp) => S::ClassifyIntent,
        (S::RespondAndOfferMore, O::Declined) => S::WakeWait,

        (step, outcome) => {
            tracing::warn!(%step, ?outcome, "outcome not valid here, returning to idle");
            S::WakeWait
        }
    }
}

/// Where a classified request goes
#[must_use]
pub const fn route(intent: Intent) -> Step {
    match intent {
        Intent::Coding => Step::GenerateTodos,
        Intent::Review => Step::ReviewCode,
        Intent::Exit => Step::WakeWait,
        Intent::Discussion | Intent::Explanation | Intent::CodeAnalysis | Intent::FileOperations => {
            Step::ExplainCode
        }
    }
}
