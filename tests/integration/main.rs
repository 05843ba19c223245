//! Integration tests for the crawl orchestrator
//!
//! Fake collaborators drive the full lifecycle; one test runs the real HTTP
//! driver and transfer against wiremock.

mod http_tests;
mod orchestrator_tests;
mod support;
