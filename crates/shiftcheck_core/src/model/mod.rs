//! Domain model for the shift checklist.
//!
//! # Responsibility
//! - Define the wire-compatible shapes exchanged with the checklist API.
//! - Keep render-time defaults (`General`, labels) next to the data they shape.
//!
//! # Invariants
//! - Item definitions are immutable once loaded for a session.
//! - A completion record exists for (item, user) iff that user has the item
//!   checked for the active date.

pub mod completion;
pub mod filter;
pub mod item;
pub mod schedule;
