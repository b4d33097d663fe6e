//! Terminal interaction: prompts in, rendered tables and status out.

pub mod prompts;
pub mod render;

pub use prompts::{Prompter, TermPrompter};
