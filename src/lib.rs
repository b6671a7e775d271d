#![forbid(unsafe_code)]

pub mod annotate;
pub mod app;
pub mod bundle;
pub mod cli;
pub mod document;
pub mod logging;
pub mod openai;
pub mod parse;
pub mod provider;
pub mod slug;
pub mod worker;
