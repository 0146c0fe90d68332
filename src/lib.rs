#![forbid(unsafe_code)]

pub mod agents;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod installer;
pub mod prompt;
pub mod source;
pub mod state;
pub mod ui;
pub mod unit;
pub mod update_check;
pub mod utils;
pub mod version;
