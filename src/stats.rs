use std::fmt::{self, Display};
use std::time::{Duration, Instant};

/// Branching figures for the nodes expanded at one level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LevelStats {
    pub processed: u64,
    pub generated: u64,
    pub pruned: u64,
    pub duplicates: u64,
}

impl LevelStats {
    /// Average children generated per processed node.
    pub fn branching(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.generated as f64 / self.processed as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct Statistics {
    started: Instant,
    stopped: Option<Instant>,
    pub processed: u64,
    pub queued: usize,
    pub pruned: u64,
    pub improved: u64,
    pub purged: u64,
    levels: Vec<LevelStats>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            stopped: None,
            processed: 0,
            queued: 0,
            pruned: 0,
            improved: 0,
            purged: 0,
            levels: Vec::new(),
        }
    }

    pub fn level(&self, level: u32) -> LevelStats {
        self.levels.get(level as usize).copied().unwrap_or_default()
    }

    pub fn level_mut(&mut self, level: u32) -> &mut LevelStats {
        let index = level as usize;
        if self.levels.len() <= index {
            self.levels.resize(index + 1, LevelStats::default());
        }
        &mut self.levels[index]
    }

    /// Per-level figures, indexed by level.
    pub fn levels(&self) -> &[LevelStats] {
        &self.levels
    }

    pub fn stop(&mut self) {
        self.stopped.get_or_insert_with(Instant::now);
    }

    pub fn elapsed(&self) -> Duration {
        self.stopped
            .unwrap_or_else(Instant::now)
            .duration_since(self.started)
    }
}

/// One progress line: `[hh:mm:ss]  processed, queued, pruned, improved`.
impl Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let seconds = self.elapsed().as_secs();
        write!(
            f,
            "[{:02}:{:02}:{:02}] {:>8} processed, {:>8} queued, {} pruned, {} improved.",
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60,
            self.processed,
            self.queued,
            self.pruned,
            self.improved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_stats_grow_on_demand() {
        let mut stats = Statistics::new();
        stats.level_mut(3).processed += 2;
        stats.level_mut(3).generated += 7;
        assert_eq!(stats.levels().len(), 4);
        assert_eq!(stats.level(0), LevelStats::default());
        assert_eq!(stats.level(3).generated, 7);
        assert_eq!(stats.level(3).branching(), 3.5);
        assert_eq!(stats.level(10), LevelStats::default());
    }

    #[test]
    fn stopped_clock_is_frozen() {
        let mut stats = Statistics::new();
        stats.stop();
        let first = stats.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(stats.elapsed(), first);
    }

    #[test]
    fn progress_line() {
        let mut stats = Statistics::new();
        stats.processed = 10_000;
        stats.queued = 321;
        stats.pruned = 5;
        stats.improved = 1;
        assert_eq!(
            stats.to_string(),
            "[00:00:00]    10000 processed,      321 queued, 5 pruned, 1 improved."
        );
    }
}
