use crate::level::LogLevel;

/// Accepts levels at least as severe as a configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinLevelFilter {
    threshold: LogLevel,
}

impl MinLevelFilter {
    pub fn new(threshold: LogLevel) -> Self {
        Self { threshold }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.threshold
    }
}

impl Default for MinLevelFilter {
    /// Allows everything.
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

/// Build a standalone predicate returning `true` when a level is at least
/// as severe as `threshold`.
pub fn min_level_filter(threshold: LogLevel) -> impl Fn(LogLevel) -> bool + Copy + Send + Sync {
    let filter = MinLevelFilter::new(threshold);
    move |level| filter.enabled(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_equal_or_more_severe_levels_only() {
        // ALL is sorted most severe first, so a smaller index is a higher level.
        for (i, &min) in LogLevel::ALL.iter().enumerate() {
            let enabled = min_level_filter(min);
            for (j, &level) in LogLevel::ALL.iter().enumerate() {
                assert_eq!(
                    enabled(level),
                    j <= i,
                    "threshold {min}, candidate {level}"
                );
            }
        }
    }

    #[test]
    fn default_allows_everything() {
        let filter = MinLevelFilter::default();
        assert!(LogLevel::ALL.iter().all(|&l| filter.enabled(l)));
    }
}
