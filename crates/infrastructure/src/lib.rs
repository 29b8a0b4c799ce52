pub mod dns;
pub mod lists;
pub mod repositories;
