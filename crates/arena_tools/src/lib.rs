//! # Arena Development Tools
//!
//! Command-line tools for development:
//! - Data validators for unit, card and rule tables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod validate;
