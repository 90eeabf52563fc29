pub mod consent_flow_service;
pub mod flow;

pub use consent_flow_service::{ConsentFlowService, FlowResults, FlowStart};
pub use flow::FlowRegistry;
