//! # Tread Lightly Test Suite
//!
//! End-to-end checks of the binary: option parsing, and the full pipeline from
//! a Willy Weather response body to the packaged forecast.

mod pipeline_tests;
