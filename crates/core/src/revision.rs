//! Optimistic concurrency expectations for externally stored tables.

/// Revision a writer expects a table to be at when its write lands.
///
/// The external store bumps a table's revision on every committed write. A
/// writer that read revision `r` and passes `Exact(r)` only commits if nobody
/// else wrote in between, which turns the read-check-write sequence into a
/// compare-and-swap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedRevision {
    /// Skip revision checking (seeding, migrations, test fixtures).
    Any,
    /// Require the table to be at an exact revision.
    Exact(u64),
}

impl ExpectedRevision {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedRevision::Any => true,
            ExpectedRevision::Exact(r) => r == actual,
        }
    }
}
