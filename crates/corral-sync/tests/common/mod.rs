//! Common test infrastructure for corral-sync tests
//!
//! # Modules
//!
//! - `fixtures`: on-disk catalog checkouts built in a temp directory

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;
