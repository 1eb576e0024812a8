//! Integration tests for hlwatch-bot.
//!
//! These tests verify the interaction between components:
//! - Feed connection lifecycle against a mock server
//! - Fill routing from the feed to the notifier
//! - Application shutdown and fatal feed errors

pub mod common;
