#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Vendor tree installation for vendr
//!
//! This crate turns a manifest or lock into a populated vendor directory.
//! [`Installer::update`] resolves imports, fetching missing repositories on
//! demand, aggregates them into one dependency per repository and refreshes
//! every repository through a bounded [`FetchPool`]. [`Installer::install`]
//! replays a lock and [`Installer::checkout`] only fills in what is absent.

mod aggregate;
mod api;
mod handler;
mod installer;
mod pool;
mod prune;

pub use aggregate::{aggregate_packages, aggregate_packages_dedup};
pub use api::config::{InstallConfig, DEFAULT_WORKERS};
pub use api::result::{InstallOutcome, UpdateEntry, UpdateOutcome, UpdateReport};
pub use handler::VendorFetchHandler;
pub use installer::{Installer, UpdateResult};
pub use pool::FetchPool;
pub use prune::prune_unused;
