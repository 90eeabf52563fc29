mod registry;

pub use registry::FlowRegistry;
