pub mod http;
pub mod protocol;

pub use http::{spawn_worker, BackendClient, NetError};
pub use protocol::{Incoming, Outbound};
