//! Network transport primitives.
//!
//! Provides the endpoint type and a non-blocking UDP socket wrapper shared
//! by the client and server roles. Reports travel as single datagrams; the
//! socket layer offers no sequencing, acknowledgment, or retransmission.

pub mod endpoint;
pub mod socket;

pub use endpoint::Endpoint;
pub use socket::UdpSocket;
