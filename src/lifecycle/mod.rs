//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve credential → Load CA → Bind metrics → Start proxy
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Both servers stop accepting → In-flight exchanges finish → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
