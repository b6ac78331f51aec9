#![allow(dead_code)]

pub mod clients;
pub mod fixtures;

pub use clients::*;
pub use fixtures::*;
