//! Interactive container image editing.
//!
//! Open an image in a disposable idle container, copy files out of or
//! into it over any number of rounds, optionally commit the mutated
//! filesystem as a new image, and clean the container up at the end.

pub mod cli;
pub mod session;
pub mod ui;

pub use session::{SessionConfig, SessionController, SessionSummary};
