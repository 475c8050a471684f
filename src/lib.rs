//! # Wardbot - housing and to-do tracking for a FFXIV free company
//!
//! Wardbot answers backslash-prefixed chat commands to track open housing
//! plots across the four residential districts, keep a shared to-do list, and
//! look up items against an XIVAPI-compatible database.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wardbot::bot::CommandHandler;
//! use wardbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut handler = CommandHandler::open(&config)?;
//!     if let Some(reply) = handler.handle("alice", "\\gethouses").await {
//!         println!("{reply}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bot`] - command parsing, command handling, item lookups
//! - [`store`] - the listing and to-do stores with JSON snapshot persistence
//! - [`config`] - configuration management and validation
//! - [`logutil`] - log sanitation for raw chat text
//!
//! ## Architecture
//!
//! The chat transport (Discord, console, tests) is an external collaborator:
//! it supplies sender identity and raw text and delivers replies. Everything
//! behind [`bot::CommandHandler`] is transport-agnostic. Stores own their
//! collections and rewrite a whole JSON snapshot after every mutation; the
//! snapshot adapter is a trait so tests run against an in-memory fake.

pub mod bot;
pub mod config;
pub mod logutil;
pub mod store;
