//! Runs matched solution scripts and turns whatever happens into an
//! [`ExecutionOutcome`].

pub mod dispatcher;
pub mod kind;
pub mod outcome;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use kind::{Interpreters, ScriptKind};
pub use outcome::{ExecutionOutcome, UNSUPPORTED_FILE_TYPE};
