//! End-to-end test support for the Renshu review engine
//!
//! - [`harness::TestEngine`]: queue and sessions over a temporary SQLite database with a manual clock
//! - [`mocks::TestDataFactory`]: study decks and pre-built scheduling scenarios

pub mod harness;
pub mod mocks;

pub use harness::TestEngine;
pub use mocks::{DeckConfig, TestDataFactory, TestScenario};
