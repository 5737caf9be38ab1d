/// Key symbols that toggle secret mode, in order.
pub const KONAMI_SEQUENCE: [&str; 11] = [
    "ArrowUp",
    "ArrowUp",
    "ArrowDown",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "ArrowLeft",
    "ArrowRight",
    "b",
    "a",
    "Enter",
];

/// Tracks progress through [`KONAMI_SEQUENCE`].
///
/// A mismatching key resets progress, except that a key equal to the first symbol counts
/// as the start of a new attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KonamiDetector {
    position: usize,
}

impl KonamiDetector {
    /// Detector waiting for the first symbol.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of symbols matched so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Feed one key symbol. Returns `true` when it completes the sequence.
    pub fn feed(&mut self, key: &str) -> bool {
        if KONAMI_SEQUENCE[self.position] == key {
            self.position += 1;
        } else if KONAMI_SEQUENCE[0] == key {
            self.position = 1;
        } else {
            self.position = 0;
        }

        if self.position == KONAMI_SEQUENCE.len() {
            self.position = 0;
            return true;
        }
        false
    }

    /// Drop any partial progress.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}
