//! BookBuddy application library
//!
//! The `auth`, `books` and `users` modules, the state they share, and the
//! bootstrap that wires them into the module kernel.

pub mod bootstrap;
pub mod modules;
pub mod state;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use bootstrap::{build_app, run, App};
pub use state::AppState;
