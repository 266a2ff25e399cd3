//! Test data

mod fixtures;

pub use fixtures::{DeckConfig, TestDataFactory, TestScenario};
