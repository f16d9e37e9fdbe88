#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard orchestration and presentation.
//!
//! [`load::run_load`] validates a ZIP code and periods, fetches the primary
//! and comparison periods and the map location concurrently, compares the
//! two records and builds a [`view::DashboardView`]. The fetch and compare
//! steps are stateless; everything that survives between loads lives in a
//! [`session::DashboardSession`].

pub mod load;
pub mod notify;
pub mod session;
pub mod view;

pub use load::{DashboardServices, LoadError, LoadReport, LoadRequest, run_load};
pub use notify::{Notification, NotificationLevel, StatusBoard};
pub use session::{DashboardSession, LoadOutcome};
pub use view::DashboardView;
