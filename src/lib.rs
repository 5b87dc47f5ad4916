mod aggregate;
pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod export;
pub mod filter;
pub mod model;
mod paginate;
mod poll;
pub mod render;
mod utils;
pub mod view;


pub use aggregate::{percent_of, summarize, Summary};
pub use api::Mode;
pub use config::Config;
pub use error::{Error, LoadError, Result};
pub use paginate::{Page, PageState};
pub use poll::Poller;
