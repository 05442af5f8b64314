// Article reader: folders of uploaded articles with human and AI comments.
// Everything lives in process memory; nothing survives a restart.

pub mod handlers;
pub mod markers;
pub mod models;
pub mod prompts;
pub mod store;
