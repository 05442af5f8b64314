// Streamed chat for the playground and homework helper pages.

pub mod data_stream;
pub mod handlers;
pub mod prompts;
