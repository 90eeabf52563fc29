//! Consent flow session.

pub mod model;
pub mod state;

pub use model::Session;
pub use state::FlowState;
