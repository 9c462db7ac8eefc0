//! Parsers for annotation and global configuration values.
//!
//! Every parser returns a [`ParseError`](crate::error::ParseError) on malformed
//! input instead of panicking, so callers can always fall back to an inherited
//! value.

mod directive;
mod value;

pub use directive::*;
pub use value::*;
