// Acquisition-facing streaming API.
//
// - `packet` : typed datafeed packets (logic and pass-through kinds)
// - `session`: OutputSession: init/receive/cleanup lifecycle handle

pub mod packet;
pub mod session;

pub use packet::Packet;
pub use session::{OutputSession, SessionError};
