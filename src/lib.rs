#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod emit;
pub mod fetch;
pub mod formats;
pub mod import;
pub mod inspect;
pub mod ledger;
pub mod logging;
pub mod paths;
pub mod php;
pub mod record;
pub mod rewrite;
pub mod wxr;
