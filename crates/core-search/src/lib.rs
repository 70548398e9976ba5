//! Interactive incremental search and query replace.
//!
//! `SearchEngine` holds the string being typed and drives a
//! [`BufferSearchTarget`]; [`IncrementalSearchController`] and
//! [`QueryReplaceController`] layer session logic on top of it. Sessions
//! borrow their host and the [`HistoryRegistry`] for their whole lifetime and
//! report back through [`Step`] and [`SessionResult`]. Nothing is rendered
//! here: prompts are strings and the bell is a queued [`Signal`].

pub mod command;
pub mod engine;
pub mod error;
pub mod history;
pub mod isearch;
pub mod policy;
pub mod replace;
pub mod session;
pub mod state;
pub mod target;

pub use command::{AnswerParseError, ReplaceAnswer, SearchCommand, parse_answer};
pub use engine::{EngineOptions, InputOrigin, SearchEngine, Signal};
pub use error::SearchError;
pub use history::{HistoryFlavor, HistoryRegistry};
pub use isearch::{IncrementalSearchController, IsearchKind};
pub use policy::{CaseOverride, CasePolicy, PatternPolicy, ReplacementTemplate, case_replace};
pub use replace::{QueryReplaceController, ReplaceMode, ReplaceOptions, ReplaceStage};
pub use session::{Outcome, SessionResult, Step};
pub use state::{Direction, SearchState, StateStack, WrapState};
pub use target::{
    BufferSearchTarget, FindRequest, MarkRing, SearchHost, TargetError, UndoGroup, UndoGroupGuard,
};
