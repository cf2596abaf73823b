//! thoughtchain stdio server.
//!
//! Serves the `sequential_thinking` tool over newline-delimited JSON-RPC on
//! stdin/stdout, with stdout guarded so that only protocol frames reach it.

pub mod cli;
pub mod error;
pub mod stdio;
