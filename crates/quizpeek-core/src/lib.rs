pub mod answer;
pub mod backend;
pub mod classify;
pub mod config;
pub mod errors;
pub mod guard;
pub mod logging;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod request;
