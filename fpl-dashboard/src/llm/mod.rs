// Narrative analyses: streaming client, prompt templates and result parsing.

pub mod client;
pub mod prompt;
pub mod results;
