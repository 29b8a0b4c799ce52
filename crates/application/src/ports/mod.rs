mod replacement_store;
mod upstream_forwarder;

pub use replacement_store::ReplacementStore;
pub use upstream_forwarder::{UpstreamForwarder, UpstreamResponse};
