//! # Integration Tests Crate
//!
//! End-to-end scenarios over the wired notifier stack, without real sockets
//! or a real broker: upstream frames enter through the payload handler, flow
//! through the configured egress, and land in recording test doubles.
//!
//! ## Structure
//!
//! ```text
//! integration-tests/
//! └── src/
//!     ├── lib.rs        # This file
//!     ├── support.rs    # Test doubles and stack builders
//!     └── end_to_end.rs # Scenario tests
//! ```

pub mod support;

#[cfg(test)]
mod end_to_end;
