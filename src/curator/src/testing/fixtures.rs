//! Canned clusters shared by unit and end-to-end tests.

use super::SnapshotBuilder;
use crate::registry::AllocationType;

pub const MIB: u64 = 1 << 20;
pub const GIB: u64 = 1 << 30;

/// Two daily indices, both open and one GiB each.
///
/// | index              | created    | timestamp min/max       | notes            |
/// |--------------------|------------|-------------------------|------------------|
/// | `index-2016.03.03` | 1456963200 | 1456963201 / 1457049599 | `include.tag=foo`, 71 segments on shard 0 |
/// | `index-2016.03.04` | 1457049600 | 1457049601 / 1457135999 | fully merged     |
pub fn two_indices() -> SnapshotBuilder {
    SnapshotBuilder::new()
        .index("index-2016.03.03", |index| {
            index
                .created(1456963200)
                .size(GIB)
                .allocation(AllocationType::Include, "tag", "foo")
                .segments(&[71, 2])
                .field("timestamp", 1456963201, 1457049599)
        })
        .index("index-2016.03.04", |index| {
            index
                .created(1457049600000)
                .size(GIB)
                .segments(&[1, 1])
                .field("timestamp", 1457049601, 1457135999)
        })
}

/// Four daily indices, `c-2016.03.05` closed.
///
/// Sizes are 1 GiB, 512 MiB, 512 MiB and 1 GiB in name order.
pub fn four_indices() -> SnapshotBuilder {
    SnapshotBuilder::new()
        .index("a-2016.03.03", |index| {
            index
                .created(1456963200)
                .size(GIB)
                .field("timestamp", 1456963201, 1457049599)
        })
        .index("b-2016.03.04", |index| {
            index
                .created(1457049600)
                .size(512 * MIB)
                .field("timestamp", 1457049601, 1457135999)
        })
        .index("c-2016.03.05", |index| {
            index
                .created(1457136000)
                .size(512 * MIB)
                .closed()
                .field("timestamp", 1457136001, 1457222399)
        })
        .index("d-2016.03.06", |index| {
            index
                .created(1457222400)
                .size(GIB)
                .field("timestamp", 1457222401, 1457308799)
        })
}
