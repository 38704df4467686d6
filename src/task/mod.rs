#![forbid(unsafe_code)]

pub mod model;
pub mod operator;
pub mod store;
