//! An interactive expense tracker that stores its records in a Google spreadsheet.
//!
//! The binary's `run` command shows a menu on the terminal. New expenses are validated field by
//! field, confirmed, and appended as a row to the worksheet. Stored expenses can be listed in the
//! order they were entered or totalled per category.

mod api;
pub mod args;
pub mod commands;
mod config;
mod console;
mod error;
mod gateway;
mod menu;
pub mod model;
mod record;
mod utils;
mod validate;
mod view;


pub use api::Mode;
pub use config::Config;
pub use error::{error_type, Error, ErrorType, Result};
