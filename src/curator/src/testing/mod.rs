//! Test utilities for the curation engine.
//!
//! Builds in-memory [`SnapshotClient`](crate::client::SnapshotClient)s so
//! filters and pipelines can be exercised without a cluster.
//!
//! # Feature Flag
//!
//! This module is only available when the `testing` feature is enabled or during tests:
//!
//! ```toml
//! [dev-dependencies]
//! curator = { path = "src/curator", features = ["testing"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use curator::testing::SnapshotBuilder;
//!
//! let client = SnapshotBuilder::new()
//!     .index("logs-2016.03.03", |index| index.created(1456963200).size(1 << 30))
//!     .index("logs-2016.03.04", |index| index.closed())
//!     .build();
//! ```

mod fixtures;
mod snapshot_builder;

pub use fixtures::{GIB, MIB, four_indices, two_indices};
pub use snapshot_builder::{IndexBuilder, SnapshotBuilder};
