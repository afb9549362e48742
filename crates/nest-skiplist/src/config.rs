/// Tuning knobs for a [`ConcurrentSkipList`](crate::ConcurrentSkipList).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkipListConfig {
    /// Number of levels, including level 0. Tower heights are drawn
    /// geometrically with p = 1/2 and capped at `max_level - 1`.
    pub max_level: usize,
}

impl SkipListConfig {
    /// A config with the given level count (clamped to at least one level).
    pub fn with_max_level(max_level: usize) -> Self {
        Self {
            max_level: max_level.max(1),
        }
    }
}

impl Default for SkipListConfig {
    fn default() -> Self {
        Self { max_level: 16 }
    }
}
