pub mod forwarder;

pub use forwarder::NetworkForwarder;
