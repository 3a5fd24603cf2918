//! doclabel - document intake, classification and labeled cloud export.
//!
//! Uploaded documents are saved, turned into text, classified into a
//! category/subcategory pair and kept in an in-memory registry where the
//! label can be corrected before the whole batch is uploaded to Google Drive
//! under `<category>/<subcategory>/`.

pub mod classify;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod extraction;
pub mod models;
pub mod registry;
pub mod server;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
