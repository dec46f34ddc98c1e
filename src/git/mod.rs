//! Thin layer over the `git` executable.
//!
//! Everything above this module talks to git through the [`GitRunner`]
//! trait, which keeps inspection logic testable without a real repository.

pub mod parse;
mod runner;

pub use runner::{GitCommand, GitRunner};
