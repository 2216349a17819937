//! Editing session: the context object tying store, history and modes

pub mod mode;
pub mod session;

pub use mode::EditMode;
pub use session::{Outcome, Session, SkipReason};
