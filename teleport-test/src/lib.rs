//! Mocks and fixtures for testing teleport components

#![allow(missing_docs)]

/// Mock implementations of the collaborator traits
pub mod mocks;
/// Fixtures shared by component tests
pub mod test_utils;
