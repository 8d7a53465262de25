pub mod backup;
pub mod collection;
pub mod config;
pub mod context;
pub mod episodes;
pub mod prompts;
pub mod remote;
