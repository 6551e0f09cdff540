// Copyright 2026 Memetrace Contributors
// SPDX-License-Identifier: Apache-2.0

//! Memetrace library — collect social posts mentioning a phrase from a live
//! feed, clean and enrich them, and report on the meme's lifecycle.
//!
//! This library crate exposes the core modules for integration testing.

pub mod auth;
pub mod browser;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod report;
pub mod storage;
