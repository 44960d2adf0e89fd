// src/lib.rs

//! wnpp-watch library
//!
//! Watches the Debian orphaned-package listing and reports packages whose
//! names fuzzy-match a keyword list, once per package.

pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
