//! # API Route Modules
//!
//! - `store`: store redirect and store switch endpoints.
//! - `messages`: flash message section, drained on read.

pub mod messages;
pub mod store;
