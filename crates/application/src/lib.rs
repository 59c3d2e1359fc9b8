//! Warden DNS Application Layer
//!
//! Ports every pipeline stage implements and the use cases that drive the
//! pipeline from the network boundary.
pub mod ports;
pub mod use_cases;
