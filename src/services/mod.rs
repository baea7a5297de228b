//! Service layer for the scraper.
//!
//! This module contains the building blocks of a run:
//! - Search string generation (`Alphabet`, `generate`)
//! - Hash bucketing (`assign`, `partition`)
//! - Remote search (`SearchClient`, `RegbookClient`)
//! - Result page parsing (`ResponseParser`)

pub mod alphabet;
mod client;
pub mod parser;
pub mod partition;

pub use alphabet::{Alphabet, generate};
pub use client::{RegbookClient, SearchClient};
pub use parser::{ParsedPage, ResponseParser};
pub use partition::{assign, partition, select_bucket};
