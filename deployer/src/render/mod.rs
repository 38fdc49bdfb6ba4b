//! Progress rendering

pub mod driver;
pub mod sink;
pub mod tree;
