pub mod action;
pub mod cli;
pub mod error;
pub mod logging;
pub mod progress;
pub mod prompt;
pub mod run;
pub mod session;
