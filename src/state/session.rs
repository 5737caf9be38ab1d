//! Per-connection UI state and the reducer driving it.
//!
//! [`Session::apply`] is synchronous and free of I/O; timers and persistence are left to
//! the caller through the returned [`SessionEffect`]s.

use std::sync::Arc;

use crate::{
    catalog::{ALL_CATEGORIES, SortKey, compute_visible, shuffle},
    dao::models::{GameRecord, Theme},
    state::{konami::KonamiDetector, lucky_charm::LuckyCharm},
};

/// Search, filter and navigation state of one connected client.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub search_term: String,
    pub category: String,
    pub sort: SortKey,
    pub selected_game: Option<String>,
    pub sidebar_open: bool,
    pub theme: Theme,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            category: ALL_CATEGORIES.to_string(),
            sort: SortKey::default(),
            selected_game: None,
            sidebar_open: false,
            theme: Theme::default(),
        }
    }
}

/// Easter-egg state of one connected client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretState {
    pub konami: KonamiDetector,
    pub lucky_charm: LuckyCharm,
    pub secret_mode: bool,
}

/// Input accepted by [`Session::apply`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Key(String),
    LuckyCharm,
    Search(String),
    Category(String),
    Sort(SortKey),
    SelectGame(String),
    CloseGame,
    ToggleSidebar,
    ToggleTheme,
    CatalogReplaced(Arc<Vec<GameRecord>>),
}

/// Output of [`Session::apply`], in the order it should be acted upon.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    Visible(Vec<GameRecord>),
    SecretMode(bool),
    Shuffled,
    Selected(Option<GameRecord>),
    Sidebar(bool),
    Theme(Theme),
    RearmIdle,
    Notify(String),
}

/// One client's view over the catalog plus its interaction state machines.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    secret: SecretState,
    catalog: Vec<GameRecord>,
}

impl Session {
    pub fn new(catalog: &[GameRecord], theme: Theme) -> Self {
        Self {
            state: SessionState {
                theme,
                ..SessionState::default()
            },
            secret: SecretState::default(),
            catalog: catalog.to_vec(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn secret(&self) -> &SecretState {
        &self.secret
    }

    /// The list the client should currently display.
    pub fn visible(&self) -> Vec<GameRecord> {
        compute_visible(
            &self.catalog,
            &self.state.search_term,
            &self.state.category,
            self.state.sort,
        )
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.state.theme = theme;
    }

    pub fn apply(&mut self, event: SessionEvent) -> Vec<SessionEffect> {
        match event {
            SessionEvent::Key(key) => {
                if self.secret.konami.feed(&key) {
                    self.secret.secret_mode = !self.secret.secret_mode;
                    vec![SessionEffect::SecretMode(self.secret.secret_mode)]
                } else {
                    Vec::new()
                }
            }
            SessionEvent::LuckyCharm => {
                if self.secret.lucky_charm.click() {
                    shuffle(&mut self.catalog);
                    vec![SessionEffect::Shuffled, SessionEffect::Visible(self.visible())]
                } else {
                    Vec::new()
                }
            }
            SessionEvent::Search(term) => {
                self.state.search_term = term;
                vec![SessionEffect::Visible(self.visible())]
            }
            SessionEvent::Category(category) => {
                self.state.category = category;
                vec![SessionEffect::Visible(self.visible())]
            }
            SessionEvent::Sort(sort) => {
                self.state.sort = sort;
                vec![SessionEffect::Visible(self.visible())]
            }
            SessionEvent::SelectGame(id) => match self.catalog.iter().find(|g| g.id == id) {
                Some(game) => {
                    self.state.selected_game = Some(id);
                    vec![SessionEffect::Selected(Some(game.clone()))]
                }
                None => vec![SessionEffect::Notify(format!("game `{id}` not found"))],
            },
            SessionEvent::CloseGame => {
                self.state.selected_game = None;
                vec![SessionEffect::Selected(None), SessionEffect::RearmIdle]
            }
            SessionEvent::ToggleSidebar => {
                self.state.sidebar_open = !self.state.sidebar_open;
                vec![SessionEffect::Sidebar(self.state.sidebar_open)]
            }
            SessionEvent::ToggleTheme => {
                self.state.theme = self.state.theme.toggled();
                vec![SessionEffect::Theme(self.state.theme)]
            }
            SessionEvent::CatalogReplaced(catalog) => {
                self.catalog = catalog.as_ref().clone();
                let mut effects = Vec::new();
                if let Some(selected) = self.state.selected_game.as_deref()
                    && !self.catalog.iter().any(|g| g.id == selected)
                {
                    self.state.selected_game = None;
                    effects.push(SessionEffect::Selected(None));
                }
                effects.push(SessionEffect::Visible(self.visible()));
                effects
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dao::defaults::default_games, state::konami::KONAMI_SEQUENCE};

    fn catalog() -> Vec<GameRecord> {
        default_games()
            .into_iter()
            .enumerate()
            .map(|(index, mut game)| {
                game.id = format!("g{index}");
                game
            })
            .collect()
    }

    fn visible_names(effects: &[SessionEffect]) -> Vec<String> {
        effects
            .iter()
            .find_map(|effect| match effect {
                SessionEffect::Visible(games) => {
                    Some(games.iter().map(|g| g.name.clone()).collect())
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    #[test]
    fn search_narrows_the_visible_list() {
        let mut session = Session::new(&catalog(), Theme::Dark);
        let effects = session.apply(SessionEvent::Search("SNAKE".into()));
        assert_eq!(visible_names(&effects), ["Snake"]);
    }

    #[test]
    fn konami_sequence_toggles_secret_mode_on_then_off() {
        let mut session = Session::new(&catalog(), Theme::Dark);
        let mut toggles = Vec::new();
        for key in KONAMI_SEQUENCE.iter().chain(KONAMI_SEQUENCE.iter()) {
            for effect in session.apply(SessionEvent::Key(key.to_string())) {
                if let SessionEffect::SecretMode(enabled) = effect {
                    toggles.push(enabled);
                }
            }
        }
        assert_eq!(toggles, [true, false]);
        assert!(!session.secret().secret_mode);
    }

    #[test]
    fn seventh_lucky_charm_click_shuffles() {
        let original = catalog();
        let mut session = Session::new(&original, Theme::Dark);
        for _ in 0..6 {
            assert!(session.apply(SessionEvent::LuckyCharm).is_empty());
        }
        let effects = session.apply(SessionEvent::LuckyCharm);
        assert_eq!(effects[0], SessionEffect::Shuffled);

        let mut names = visible_names(&effects);
        let mut expected: Vec<_> = original.iter().map(|g| g.name.clone()).collect();
        names.sort();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[test]
    fn catalog_replacement_drops_missing_selection() {
        let games = catalog();
        let mut session = Session::new(&games, Theme::Dark);
        session.apply(SessionEvent::SelectGame("g0".into()));
        assert_eq!(session.state().selected_game.as_deref(), Some("g0"));

        let effects = session.apply(SessionEvent::CatalogReplaced(Arc::new(games[1..].to_vec())));
        assert_eq!(effects[0], SessionEffect::Selected(None));
        assert_eq!(visible_names(&effects).len(), games.len() - 1);
    }

    #[test]
    fn closing_a_game_rearms_the_idle_timer() {
        let mut session = Session::new(&catalog(), Theme::Dark);
        session.apply(SessionEvent::SelectGame("g1".into()));
        let effects = session.apply(SessionEvent::CloseGame);
        assert_eq!(effects, [SessionEffect::Selected(None), SessionEffect::RearmIdle]);
    }

    #[test]
    fn unknown_selection_notifies() {
        let mut session = Session::new(&catalog(), Theme::Dark);
        let effects = session.apply(SessionEvent::SelectGame("missing".into()));
        assert!(matches!(effects[..], [SessionEffect::Notify(_)]));
        assert!(session.state().selected_game.is_none());
    }

    #[test]
    fn theme_and_sidebar_toggle() {
        let mut session = Session::new(&catalog(), Theme::Light);
        assert_eq!(session.apply(SessionEvent::ToggleTheme), [SessionEffect::Theme(Theme::Dark)]);
        assert_eq!(session.apply(SessionEvent::ToggleSidebar), [SessionEffect::Sidebar(true)]);
        assert_eq!(session.apply(SessionEvent::ToggleSidebar), [SessionEffect::Sidebar(false)]);
    }
}
