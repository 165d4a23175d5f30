#![allow(dead_code)]

#[macro_use]
pub mod test_utils;
