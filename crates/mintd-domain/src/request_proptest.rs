//! Property-based tests for creation-request normalization.
