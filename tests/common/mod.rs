//! Shared fixtures for integration tests
#![allow(dead_code)]

mod fetcher;
mod wxr_builder;

pub use fetcher::CountingFetcher;
pub use wxr_builder::{PostFixture, WxrBuilder};
