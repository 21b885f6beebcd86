//! Git operations for catalog mirrors
//!
//! Every command runs with terminal prompts disabled and is killed when it
//! exceeds the caller's time limit.

mod clone;
mod command;
mod update;

pub use clone::clone_repository;
pub use update::{get_remote_url, pull_repository};
