//! Pure catalog logic: querying, reconciliation with the remote store, and category counts.

pub mod categories;
pub mod query;
pub mod reconcile;

pub use categories::{CategoryDescriptor, describe_categories};
pub use query::{ALL_CATEGORIES, SortKey, compute_visible, shuffle};
pub use reconcile::{CatalogWrite, Reconciliation, reconcile};
