pub mod forwarding;
pub mod server;
pub mod transport;

pub use forwarding::NetworkForwarder;
pub use server::{DnsServerHandler, Ingress};
