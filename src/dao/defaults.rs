//! Built-in catalog seeded into an empty store, plus the corrections enforced on remote data.

use crate::dao::models::{Category, Difficulty, GameRecord};

/// Field of a game record that reconciliation keeps in sync with the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedField {
    ExternalUrl,
    ImageUrl,
    InternalRoute,
}

/// Records whose tracked fields are corrected when the store disagrees with the defaults.
///
/// Matching is by `name`.
pub const TRACKED_CORRECTIONS: &[(&str, &[TrackedField])] = &[
    ("2048", &[TrackedField::ExternalUrl, TrackedField::InternalRoute]),
    ("Among Us", &[TrackedField::ExternalUrl]),
];

struct Seed {
    name: &'static str,
    genre: &'static str,
    developer: &'static str,
    image: &'static str,
    url: &'static str,
    rating: f32,
    popularity: u32,
    category: Category,
    difficulty: Difficulty,
    tags: &'static [&'static str],
    route: Option<&'static str>,
    description: &'static str,
    features: &'static [&'static str],
    estimated_time: &'static str,
}

const SEEDS: &[Seed] = &[
    Seed {
        name: "Slope 2",
        genre: "Arcade",
        developer: "RoboGames",
        image: "https://placehold.co/300x200/5C007C/ffffff?text=Slope+2",
        url: "https://2slope.github.io/",
        rating: 4.2,
        popularity: 150,
        category: Category::Action,
        difficulty: Difficulty::Hard,
        tags: &["fast-paced", "endless", "challenging"],
        route: None,
        description: "Navigate a ball down a steep slope while avoiding obstacles in this fast-paced arcade game.",
        features: &["High-speed gameplay", "Challenging obstacles", "Smooth controls", "Endless levels"],
        estimated_time: "5-20 min",
    },
    Seed {
        name: "Italian Brainrot Clicker",
        genre: "Clicker",
        developer: "Pasta Devs",
        image: "https://placehold.co/300x200/004080/ffffff?text=Italian+Brainrot+Clicker",
        url: "https://italianbrainrotclicker.pages.dev/",
        rating: 3.8,
        popularity: 80,
        category: Category::Casual,
        difficulty: Difficulty::Easy,
        tags: &["clicker", "incremental", "italian"],
        route: None,
        description: "A quirky clicker game with Italian flair and endless upgrades.",
        features: &["Incremental gameplay", "Italian theme", "Multiple upgrades", "Achievements"],
        estimated_time: "10-60 min",
    },
    Seed {
        name: "2048",
        genre: "Puzzle",
        developer: "Gabriele Cirulli",
        image: "https://placehold.co/300x200/4CAF50/ffffff?text=2048",
        url: "https://specials.manoramaonline.com/Mobile/2022/2048-game/index.html",
        rating: 4.5,
        popularity: 200,
        category: Category::Puzzle,
        difficulty: Difficulty::Medium,
        tags: &["numbers", "strategy", "addictive"],
        route: Some("/games/twenty48"),
        description: "Slide numbered tiles to combine them and reach the 2048 tile in this addictive puzzle game.",
        features: &["Strategic gameplay", "Smooth animations", "Score tracking", "Undo moves"],
        estimated_time: "10-30 min",
    },
    Seed {
        name: "Flappy Bird",
        genre: "Arcade",
        developer: "Dong Nguyen",
        image: "https://placehold.co/300x200/FF5722/ffffff?text=Flappy+Bird",
        url: "https://flappybird.io/",
        rating: 3.5,
        popularity: 120,
        category: Category::Action,
        difficulty: Difficulty::Hard,
        tags: &["bird", "pipes", "challenging"],
        route: None,
        description: "Guide a bird through pipes in this notoriously difficult arcade game.",
        features: &["Simple controls", "Challenging gameplay", "Retro graphics", "High score system"],
        estimated_time: "2-10 min",
    },
    Seed {
        name: "Snake",
        genre: "Arcade",
        developer: "Classic Games Inc.",
        image: "https://placehold.co/300x200/2196F3/ffffff?text=Snake",
        url: "https://www.mathsisfun.com/games/snake.html",
        rating: 4.0,
        popularity: 180,
        category: Category::Casual,
        difficulty: Difficulty::Medium,
        tags: &["classic", "snake", "retro"],
        route: Some("/games/snake"),
        description: "Control a growing snake to eat food while avoiding walls and your own tail.",
        features: &["Classic gameplay", "Progressive difficulty", "Score tracking", "Smooth controls"],
        estimated_time: "5-15 min",
    },
    Seed {
        name: "Tetris",
        genre: "Puzzle",
        developer: "Alexey Pajitnov",
        image: "https://placehold.co/300x200/9C27B0/ffffff?text=Tetris",
        url: "https://tetris.com/play-tetris/",
        rating: 4.7,
        popularity: 250,
        category: Category::Puzzle,
        difficulty: Difficulty::Medium,
        tags: &["blocks", "classic", "legendary"],
        route: None,
        description: "Arrange falling blocks to create complete lines in this legendary puzzle game.",
        features: &["Classic Tetris gameplay", "Multiple levels", "Line clearing", "Increasing speed"],
        estimated_time: "10-45 min",
    },
    Seed {
        name: "Pac-Man",
        genre: "Arcade",
        developer: "Namco",
        image: "https://placehold.co/300x200/FFEB3B/000000?text=Pac-Man",
        url: "https://freepacman.org/",
        rating: 4.3,
        popularity: 190,
        category: Category::Action,
        difficulty: Difficulty::Medium,
        tags: &["maze", "ghosts", "classic"],
        route: None,
        description: "Navigate mazes, eat dots, and avoid ghosts in this iconic arcade classic.",
        features: &["Classic maze gameplay", "Ghost AI", "Power pellets", "Multiple levels"],
        estimated_time: "5-20 min",
    },
    Seed {
        name: "Among Us",
        genre: "Party",
        developer: "Innersloth",
        image: "https://placehold.co/300x200/8BC34A/ffffff?text=Among+Us",
        url: "https://universal-games-unblocked.vercel.app/projects/among-us/index.html",
        rating: 4.8,
        popularity: 300,
        category: Category::Multiplayer,
        difficulty: Difficulty::Easy,
        tags: &["impostor", "social", "deduction"],
        route: None,
        description: "Find the impostor among your crewmates in this social deduction game.",
        features: &["Multiplayer gameplay", "Social deduction", "Task completion", "Emergency meetings"],
        estimated_time: "10-20 min",
    },
];

/// The default catalog, without identifiers.
pub fn default_games() -> Vec<GameRecord> {
    SEEDS
        .iter()
        .map(|seed| GameRecord {
            id: String::new(),
            name: seed.name.into(),
            genre: seed.genre.into(),
            developer: seed.developer.into(),
            image_url: seed.image.into(),
            external_url: seed.url.into(),
            rating: seed.rating,
            popularity: seed.popularity,
            category: seed.category,
            difficulty: Some(seed.difficulty),
            tags: seed.tags.iter().map(|tag| tag.to_string()).collect(),
            internal_route: seed.route.map(Into::into),
            description: Some(seed.description.into()),
            features: seed.features.iter().map(|f| f.to_string()).collect(),
            estimated_time: Some(seed.estimated_time.into()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn defaults_hold_record_invariants() {
        let games = default_games();
        assert_eq!(games.len(), SEEDS.len());
        for game in &games {
            game.validate().unwrap();
        }
        let names: HashSet<_> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names.len(), games.len());
    }

    #[test]
    fn tracked_names_exist_in_defaults() {
        let games = default_games();
        for (name, _) in TRACKED_CORRECTIONS {
            assert!(games.iter().any(|g| g.name == *name), "missing {name}");
        }
    }
}
