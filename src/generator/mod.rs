pub mod context;
pub mod outlet;
pub mod parse;
pub mod prompts;
pub mod schema;
pub mod state;
pub mod types;
pub mod workflow;
