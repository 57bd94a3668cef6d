//! Testing utilities for deterministic engine tests.

pub mod stub_target;

pub use stub_target::StubTarget;
