#![allow(dead_code)]

#[path = "../../src/test_utils.rs"]
mod test_utils;

pub use test_utils::*;
