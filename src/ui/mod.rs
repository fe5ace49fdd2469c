//! egui rendering. Everything here reads [`crate::state::AppState`];
//! state changes go through its methods.

pub mod panels;
pub mod plot;
pub mod results;
pub mod tables;
