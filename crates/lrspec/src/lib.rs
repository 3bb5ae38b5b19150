//! Compile declarative grammars into canonical LR parse tables, and export
//! them in a stable format consumed by external parser runtimes.

pub mod build;
pub mod compiler;
pub mod document;
pub mod engine;
pub mod export;
pub mod grammar;
pub mod list;
pub mod precedence;
pub mod spec;
pub mod types;
pub mod util;
