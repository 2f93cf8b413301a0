// Generation API: lecture extraction, prompt building and the AI pipeline that
// produces delimited sheet text.

pub mod extract;
pub mod generator;
pub mod handlers;
pub mod prompts;
