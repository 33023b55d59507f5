//! Fake collaborators and scenario tests that drive several `nanowatch` crates together.

pub mod fakes;
pub mod util;

mod scenarios;
