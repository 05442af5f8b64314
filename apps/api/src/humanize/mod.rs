// Humanizer: rewrites AI-sounding text through the LLM.
// Rate limited per client; results kept in an in-memory history.

pub mod handlers;
pub mod history;
pub mod prompts;
pub mod rate_limiter;
