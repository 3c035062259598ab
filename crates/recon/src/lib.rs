//! `cjedb-recon` - event name resolution and story-id matching engine.
//!
//! Pure engine crate: receives scraped records and a reference store,
//! returns the resolved story table plus diagnostics. No network or
//! database dependencies.

pub mod aggregate;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod exclusion;
pub mod matcher;
pub mod model;
pub mod names;
pub mod normalize;
pub mod reference;

pub use config::ExceptionTables;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use engine::run;
pub use error::ReconError;
pub use model::{
    CharaId, Choice, EventKind, ReconResult, ResolvedEvent, ResolvedTable, RunSummary, SourceEvent,
    StoryId,
};
pub use reference::{MemoryStore, ReferenceStore};
