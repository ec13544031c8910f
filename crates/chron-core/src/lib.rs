//! # chron-core
//!
//! Core types and pure algorithms for Chronicle.
//!
//! Nothing in this crate performs I/O. It provides:
//! - The structural diff codec (`diff`, `patch`, `unpatch`)
//! - Dotted field path helpers
//! - Omit / pick filtering of deltas and the required-field gate
//! - A typed partial-update description
//! - Audit record and history entry types
//! - The history summarizer

pub mod delta;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod filter;
pub mod path;
pub mod policy;
pub mod summary;
pub mod update;
