//! Presentation-only simulators.
//!
//! These are view-model stubs for demos and UI tests: the chat presenter
//! fakes delivery receipts and the campaign simulator fakes send progress.
//! Neither touches the stores, and their fake timing contracts must not leak
//! into the ledger.

pub mod campaign;
pub mod chat;
