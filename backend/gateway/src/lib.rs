//! DevHelper Gateway
//!
//! Connection supervision, the inbound message gate, and the admin HTTP API.

pub mod admin_api;
pub mod backoff;
pub mod gate;
pub mod server;
pub mod supervisor;

pub use admin_api::{admin_router, AdminState};
pub use backoff::{ReconnectPolicy, RecoveryTrigger};
pub use gate::{evaluate, GateDecision};
pub use server::start_server;
pub use supervisor::ConnectionSupervisor;
