//! Command implementations.
//!
//! Each module exposes an `execute` function. Interactive selection always
//! happens before anything is written, so a cancelled prompt leaves both
//! disk and lockfiles untouched.

/// Unwrap a prompt answer, returning [`Outcome::Cancelled`] from the
/// enclosing function when the user backed out.
macro_rules! or_cancel {
    ($answer:expr) => {
        match $answer {
            Some(value) => value,
            None => return Ok($crate::commands::Outcome::Cancelled),
        }
    };
}

pub mod agents;
pub mod clean;
pub mod config;
pub mod install;
pub mod list;
pub mod outdated;
pub mod remove;
pub mod search;
pub mod update;

/// How an interactive command ended.
#[derive(Debug)]
pub enum Outcome<T> {
    Completed(T),
    /// The user backed out of a prompt. Nothing was changed.
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }
}
