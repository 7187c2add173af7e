pub mod accessor;
pub mod catalog;
pub mod config;
pub mod error;
pub mod features;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod relation;
pub mod source;
