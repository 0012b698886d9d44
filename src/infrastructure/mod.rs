pub mod cancel_gate;
pub mod permit_pool;

pub use cancel_gate::CancellationGate;
pub use permit_pool::{ActivityCallback, ActivityEvent, ActivityKind, PermitPool};
