//! Unit tests for the vessel JSON format.
//!
//! These tests cover the exact JSON shape, import validation and the
//! export/import round trip through the annotation store.
