//! Index metadata resolution and filter pipelines.
//!
//! An [`IndexList`] is built from the answers of a [`QueryClient`] and then
//! narrowed by an ordered chain of filters:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use curator::{IndexList, PipelineConfig, SnapshotClient};
//!
//! let client = Arc::new(SnapshotClient::load("cluster.json").await?);
//! let mut list = IndexList::new(client).await?;
//! list.iterate_filters(&config).await?;
//! list.empty_list_check()?;
//! ```

pub mod age;
pub mod client;
pub mod error;
pub mod filter;
pub mod index_list;
pub mod metadata;
pub mod pipeline;
pub mod registry;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use age::{AgeKey, AgeResolver, AgeSource, StatsResult, fix_epoch};
pub use client::{ClientError, ClusterSnapshot, Query, QueryClient, SnapshotClient};
pub use error::{CuratorError, Result};
pub use filter::FilterSpec;
pub use index_list::IndexList;
pub use metadata::MetadataResolver;
pub use pipeline::{PipelineConfig, PipelineReport, StageReport};
pub use registry::{AllocationRules, AllocationType, IndexRecord, IndexState, Registry};
