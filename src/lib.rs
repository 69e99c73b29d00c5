//! Charla is a terminal client for a chatbot backend that answers questions
//! and summarises uploaded documents.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the chat session: the controller that turns user actions
//!   into requests, the HTTP backend client, the typewriter reveal task, and
//!   configuration.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that feeds key presses into the controller.
//! - [`cli`] parses arguments and dispatches into the interactive chat or the
//!   one-shot `say`/`upload` commands.
//! - [`api`] defines the `/chat` wire payloads.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
