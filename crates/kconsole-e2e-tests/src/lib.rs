//! End-to-end tests for the kconsole console core.
//!
//! These tests exercise the crates together:
//! - Topology models driven by live watch pushes across namespace switches
//! - Catalog pickers with debounced filter input
//! - Add-disk modal sessions fed from watched reference data

#![cfg(test)]
