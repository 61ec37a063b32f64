pub mod accumulator;
pub mod app;
pub mod attachment;
pub mod capability;
pub mod chat_stream;
pub mod config;
pub mod error;
pub mod persona;
pub mod prompt;
pub mod router;
pub mod session;
