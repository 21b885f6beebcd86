//! # corral
//!
//! Catalog service binary support: command-line parsing, the serve and
//! validate commands, and the `/v1-catalog` HTTP API.

pub mod cli;
pub mod commands;
pub mod server;
