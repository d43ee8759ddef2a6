//! Reusable turn policies: confirmation, clarification and feedback
//!
//! Every policy speaks through [`Turn`], which suppresses a prompt already
//! spoken in the current turn. A turn ends when the user is heard or the
//! engine moves to another state.

mod clarify;
mod confirm;
mod feedback;
mod turn;

pub use clarify::{Clarified, ResponseCategory, categorize, clarify, clarify_with};
pub use confirm::{ConfirmPolicy, YesNo, classify_yes_no};
pub use feedback::{FeedbackReply, collect_feedback, interpret_feedback};
pub use turn::Turn;
