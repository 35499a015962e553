//! A personal budgeting core: transactions kept per calendar month, viewed one month at a time.
//!
//! A [`Budget`] composes the two moving parts over one [`store::Store`]:
//!
//! - [`MonthCursor`] decides which month is being viewed and remembers it between sessions.
//! - [`Ledger`] holds that month's transactions, validates new ones (including splits among
//!   people), filters them, and keeps the month's totals up to date.

pub mod args;
mod budget;
pub mod commands;
mod config;
pub mod cursor;
mod error;
pub mod ledger;
pub mod model;
pub mod store;
mod utils;

pub use budget::{Budget, Summary};
pub use config::Config;
pub use cursor::{Clock, FixedClock, MonthCursor, SystemClock};
pub use error::{Error, ErrorType, Result};
pub use ledger::Ledger;
