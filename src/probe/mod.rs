pub mod payloads;
pub mod prober;
pub mod response;

pub use prober::{ProbeSlot, Prober};
pub use response::{Headers, ProbeResponse};
