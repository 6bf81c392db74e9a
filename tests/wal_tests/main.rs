//! Durability log tests

mod entry_tests;
