//! Command model for loaded scripts
//!
//! A script's top-level bindings are classified into applications, callable functions and
//! other values. Applications group functions and nested applications into a tree, which is
//! converted into a clap command tree for parsing, help and docs.
//!
//! The inheritance system lets working directories and environment flow down from an
//! application to its commands and groups, while still allowing override at any level.

pub mod app;
pub mod convert;
pub mod function;
pub mod inherit;
pub mod namespace;
