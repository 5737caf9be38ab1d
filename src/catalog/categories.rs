use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    catalog::query::ALL_CATEGORIES,
    dao::models::{Category, GameRecord},
};

/// Sidebar entry with the number of records it would show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryDescriptor {
    pub id: String,
    pub name: String,
    pub color: String,
    pub gradient: [String; 2],
    pub count: usize,
}

struct Display {
    name: &'static str,
    color: &'static str,
    gradient: [&'static str; 2],
}

const ALL_GAMES: Display = Display {
    name: "All Games",
    color: "#667eea",
    gradient: ["#667eea", "#764ba2"],
};

fn display(category: Category) -> Display {
    let (name, color, end) = match category {
        Category::Action => ("Action", "#ff6b6b", "#ee5a24"),
        Category::Adventure => ("Adventure", "#4ecdc4", "#44a08d"),
        Category::Puzzle => ("Puzzle", "#45b7d1", "#96c93d"),
        Category::Racing => ("Racing", "#f39c12", "#e74c3c"),
        Category::Multiplayer => ("Multiplayer", "#9b59b6", "#8e44ad"),
        Category::Casual => ("Casual", "#e91e63", "#ad1457"),
        Category::Strategy => ("Strategy", "#2ecc71", "#27ae60"),
        Category::Trending => ("Trending", "#ff9500", "#ff6348"),
        Category::Uncategorized => ("Other", "#8B92B9", "#4A5568"),
    };
    Display { name, color, gradient: [color, end] }
}

fn descriptor(id: &str, display: &Display, count: usize) -> CategoryDescriptor {
    CategoryDescriptor {
        id: id.to_string(),
        name: display.name.to_string(),
        color: display.color.to_string(),
        gradient: display.gradient.map(str::to_string),
        count,
    }
}

/// Derive the sidebar entries for `catalog`: `all` first, then [`Category::ALL`] in order.
///
/// Uncategorized records only get an entry when there are some.
pub fn describe_categories(catalog: &[GameRecord]) -> Vec<CategoryDescriptor> {
    let per_category = Category::ALL.into_iter().filter_map(|category| {
        let count = catalog.iter().filter(|g| g.category == category).count();
        (category != Category::Uncategorized || count > 0)
            .then(|| descriptor(category.id(), &display(category), count))
    });

    std::iter::once(descriptor(ALL_CATEGORIES, &ALL_GAMES, catalog.len()))
        .chain(per_category)
        .collect()
}
