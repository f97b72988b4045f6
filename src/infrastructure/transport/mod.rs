//! Transport engine adapters

pub mod loopback;

pub use loopback::{LoopbackTransport, OpKind, TransportOp};
