//! Client-side exports of day state.

pub mod csv;
