//! Top-level facade crate for tickmeter.
//!
//! Re-exports the core metric types and the agent library so users can depend on a single crate.

pub mod core {
    pub use tickmeter_core::*;
}

pub mod agent {
    pub use tickmeter_agent::*;
}
