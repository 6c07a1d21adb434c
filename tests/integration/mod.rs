//! Integration test suite for cloudtruth-importer
//!
//! These tests drive the compiled binary end to end against a fake
//! `cloudtruth` shell script, so they only run on unix.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **import**: scanning, captures, hierarchy creation and existing-key suppression
//! - **dry_run**: logged-but-not-executed mutations and tolerated lookups
//! - **stdin**: reading a document from standard input
//! - **errors**: exit status and the single error line

#![cfg(unix)]

#[path = "../common/mod.rs"]
mod common;

mod dry_run;
mod errors;
mod import;
mod stdin;
