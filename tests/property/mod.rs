//! Property-based tests for pagination and mutation guarantees
