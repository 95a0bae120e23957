#![forbid(unsafe_code)]

pub mod annotate;
pub mod catalog;
pub mod cli;
pub mod fetch;
pub mod formats;
pub mod layout;
pub mod logging;
pub mod merge;
pub mod store;
pub mod update;
