use rand::{Rng, rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::GameRecord;

/// Category filter value that matches every record.
pub const ALL_CATEGORIES: &str = "all";

/// Ordering applied to the visible list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Catalog order, including any shuffle applied to it.
    #[default]
    Featured,
    /// Case-insensitive by name, raw name as tie-breaker.
    NameAscending,
    /// Most popular first; ties keep catalog order.
    PopularityDescending,
}

/// Case-insensitive substring match on name, genre, developer or any tag.
///
/// `needle` must already be lowercased.
fn matches_search(record: &GameRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |field: &str| field.to_lowercase().contains(needle);
    hit(&record.name)
        || hit(&record.genre)
        || hit(&record.developer)
        || record.tags.iter().any(|tag| hit(tag))
}

/// Exact match on the category id or the genre; `all` matches everything.
fn matches_category(record: &GameRecord, category: &str) -> bool {
    category == ALL_CATEGORIES || record.category.id() == category || record.genre == category
}

/// Compute the ordered subset of `catalog` to display. Never mutates the catalog.
pub fn compute_visible(
    catalog: &[GameRecord],
    search_term: &str,
    category: &str,
    sort: SortKey,
) -> Vec<GameRecord> {
    let needle = search_term.to_lowercase();
    let mut visible: Vec<GameRecord> = catalog
        .iter()
        .filter(|record| matches_search(record, &needle) && matches_category(record, category))
        .cloned()
        .collect();

    // `sort_by` is stable, so equal keys keep catalog order.
    match sort {
        SortKey::Featured => {}
        SortKey::NameAscending => visible.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        }),
        SortKey::PopularityDescending => visible.sort_by(|a, b| b.popularity.cmp(&a.popularity)),
    }

    visible
}

/// Fisher–Yates shuffle of the catalog in place.
pub fn shuffle(catalog: &mut [GameRecord]) {
    shuffle_with(catalog, &mut rng());
}

/// [`shuffle`] with a caller-supplied random source.
pub fn shuffle_with<R: Rng + ?Sized>(catalog: &mut [GameRecord], rng: &mut R) {
    catalog.shuffle(rng);
}
