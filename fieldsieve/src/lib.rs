// fieldsieve/src/lib.rs
//! # fieldsieve CLI Application
//!
//! This crate provides the command-line interface for the fieldsieve
//! sanitization and validation engine in `fieldsieve-core`.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
