//! Sugil is a terminal math-tutor chat client for hosted Gemini and
//! Gemma models.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session state and the submission pipeline:
//!   capability table, router, persona registry, prompt assembly,
//!   streaming, and response accumulation.
//! - [`api`] defines the Generative Language API payloads used by the
//!   streaming client.
//! - [`auth`] resolves the API key and the elevation token from the OS
//!   keyring and the environment.
//! - [`commands`] implements slash-command parsing used by the chat
//!   loop.
//!
//! The runtime entrypoint lives in the binary crate (`src/main.rs`),
//! which wires a line-oriented chat loop around [`core::app::ChatApp`].

pub mod api;
pub mod auth;
pub mod commands;
pub mod core;
pub mod logging;
pub mod utils;
