//! Core types shared across the crate.

pub mod completion;
pub mod message;

pub use completion::*;
pub use message::*;
