//! Core shared types for Nova's CDI build-time processor.
//!
//! This crate is intentionally small: it only knows about qualified names. Every other
//! crate (types, index, processor) keys its data by [`DotName`].

mod name;
pub mod names;

pub use name::DotName;
