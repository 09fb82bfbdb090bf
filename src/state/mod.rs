//! State management module
//!
//! This module handles all application state, including:
//! - The asset catalog and its queries (library.rs)
//! - Shared data structures (data.rs)
//! - Settings threaded through every component (config.rs)

pub mod config;
pub mod data;
pub mod library;
