pub mod config;
pub mod dates;
pub mod fetch;
pub mod harness;
pub mod links;
pub mod merge;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod stats;
pub mod trace;
pub mod validate;
