// Adapters layer: concrete implementations talking to external systems.

pub mod actuator;
