//! Pokedex CLI Library
//!
//! This module exposes the cache, API client, session and CLI modules for use
//! in integration tests.

pub mod app;
pub mod cache;
pub mod catch;
pub mod cli;
pub mod data;
pub mod repl;
