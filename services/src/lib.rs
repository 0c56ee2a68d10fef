//! Gradebook intake: archive extraction, per-student organization, submission
//! log parsing and roster import.

pub mod archive;
pub mod error;
pub mod gradebook;
pub mod organizer;
pub mod roster;
pub mod submission_log;
pub mod submission_recorder;

pub use error::ServiceError;
