/// Clicks needed before the catalog is shuffled.
pub const LUCKY_CHARM_THRESHOLD: u32 = 7;

/// Session-scoped click counter that fires a shuffle every [`LUCKY_CHARM_THRESHOLD`] clicks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LuckyCharm {
    clicks: u32,
}

impl LuckyCharm {
    /// Counter starting at zero clicks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clicks registered since the last shuffle.
    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    /// Register a click. Returns `true` when the catalog should be shuffled.
    pub fn click(&mut self) -> bool {
        self.clicks += 1;
        if self.clicks >= LUCKY_CHARM_THRESHOLD {
            self.clicks = 0;
            true
        } else {
            false
        }
    }
}
