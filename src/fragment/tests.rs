//! Unit tests for the frame codec.
//!
//! Tests are split into focused submodules to keep each file short and easy
//! to navigate.

mod property_tests;
mod reassembler_tests;
