//! Data models for the application
//!
//! Everything here is per-submission and ephemeral except the address book,
//! which is built once from configuration and shared read-only.

mod address_book;
mod attachment;
mod report;
mod upload;

pub use address_book::*;
pub use attachment::*;
pub use report::*;
pub use upload::*;
