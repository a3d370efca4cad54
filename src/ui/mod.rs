/// egui rendering of a [`crate::state::Session`]: controls write to the
/// session, views only read from it.
pub mod panels;
pub mod plot;
pub mod table;
pub mod timeline;
