pub mod common;
pub mod lifecycle_tests;
