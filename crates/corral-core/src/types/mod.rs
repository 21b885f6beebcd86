//! Type definitions for catalogs and the parsed template tree

mod catalog;
mod template;

pub use catalog::*;
pub use template::*;
