#![allow(dead_code)]
#![allow(unused_imports)]

mod messages;
mod mock_ports;

pub use messages::*;
pub use mock_ports::*;
