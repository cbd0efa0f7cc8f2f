//! Rick and Morty loader command-line frontend
//!
//! This crate wires [`rickmorty_core::Catalog`] to a terminal: it parses
//! flags into a catalog configuration and renders the event stream and
//! the loaded dataset.

pub mod cli;
pub mod render;

pub use cli::Cli;
