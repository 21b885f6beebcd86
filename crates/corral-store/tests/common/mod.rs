//! Common test infrastructure for corral-store tests
//!
//! # Modules
//!
//! - `fake_sync`: in-memory `RepositorySync` with scripted trees and failures
//! - `builders`: parsed template tree builders
//! - `waiting`: polling helpers for background refreshes

#![allow(dead_code)]

pub mod builders;
pub mod fake_sync;
pub mod waiting;

pub use builders::*;
pub use fake_sync::*;
pub use waiting::*;
