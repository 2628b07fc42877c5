//! # persondb
//!
//! Host process for `persondb-core`: configuration resolution and the
//! command-line surface. The binary in `main.rs` only bootstraps logging and
//! prints what [`cli::execute`] returns.

pub mod cli;
pub mod config;
