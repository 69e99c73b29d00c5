//! Terminal UI layer for interactive chat sessions.
//!
//! [`chat_loop`] reads keys, dispatches them to the
//! [`crate::core::controller::ChatController`] and runs the resulting
//! commands. [`renderer`], [`layout`] and [`theme`] turn the transcript into a
//! ratatui frame. All chat semantics live in [`crate::core`].

pub mod chat_loop;
pub mod layout;
pub mod renderer;
pub mod theme;
