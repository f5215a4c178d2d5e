//! Leadboard - Sales pipeline boards with AI-assisted prospecting from the command line
//!
//! This library provides the core functionality for Leadboard, including:
//! - Data models for stages, prospects and deals
//! - Pipeline grouping into kanban columns with per-column totals
//! - The drag/drop controller that turns gestures into board intents
//! - The AI assist gateway (prompts, Gemini client, request lifecycle)
//! - The subscription checkout placeholder
//! - The board file and configuration store
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use leadboard::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod assist;
pub mod board;
pub mod cli;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod subscription;
pub mod utils;
