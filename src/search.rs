//! Best-first branch-and-bound search over packed boards.
//!
//! The loop pops the lowest-priority state, expands it with every legal move and admits the
//! children that can still beat the best solution found so far. Finding a solution tightens the
//! bound and purges the queue. The result is the chain of canonical keys from the start position
//! to the solved board, which [`crate::reconstruct`] replays into readable moves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use rustc_hash::FxHashMap;
use tracing::{debug, info, trace, warn};

use crate::board::Board;
use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::packed::{PackedKey, PackedState};
use crate::queue::OrderedQueue;
use crate::reconstruct::{reconstruct, Solution};
use crate::stats::Statistics;

/// Non-blocking stop signal, polled once per iteration.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

/// Never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct Never;

impl Cancellation for Never {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: Cancellation + ?Sized> Cancellation for Arc<T> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: Cancellation + ?Sized> Cancellation for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverCommand {
    Stop,
}

impl Cancellation for Receiver<SolverCommand> {
    fn is_cancelled(&self) -> bool {
        matches!(self.try_recv(), Ok(SolverCommand::Stop))
    }
}

/// Hooks into the search loop. Every method defaults to doing nothing.
pub trait SearchObserver {
    /// Called every `progress_every` iterations (never when it is 0) and once when the search
    /// ends.
    fn on_progress(&mut self, _statistics: &Statistics) {}

    /// Called once with the final statistics, after the last [`Self::on_progress`].
    fn on_finish(&mut self, _statistics: &Statistics) {}

    fn on_solution(&mut self, _level: u32, _steps: usize, _purged: usize) {}

    fn on_expand(&mut self, _state: &PackedState) {}
}

/// Reports progress and new solutions through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SearchObserver for LogObserver {
    fn on_progress(&mut self, statistics: &Statistics) {
        info!("{}", statistics);
    }

    fn on_solution(&mut self, level: u32, steps: usize, purged: usize) {
        info!(level, steps, purged, "new optimal solution found");
    }

    fn on_finish(&mut self, statistics: &Statistics) {
        for (level, figures) in statistics.levels().iter().enumerate() {
            if figures.processed == 0 {
                continue;
            }
            info!(
                level,
                processed = figures.processed,
                generated = figures.generated,
                pruned = figures.pruned,
                duplicates = figures.duplicates,
                branching = figures.branching(),
                "level summary"
            );
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl SearchObserver for Silent {}

impl<O: SearchObserver + ?Sized> SearchObserver for &mut O {
    fn on_progress(&mut self, statistics: &Statistics) {
        (**self).on_progress(statistics)
    }

    fn on_solution(&mut self, level: u32, steps: usize, purged: usize) {
        (**self).on_solution(level, steps, purged)
    }

    fn on_expand(&mut self, state: &PackedState) {
        (**self).on_expand(state)
    }

    fn on_finish(&mut self, statistics: &Statistics) {
        (**self).on_finish(statistics)
    }
}

/// Why the search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The queue ran empty: with no relaxation the best solution is optimal, and no solution
    /// means none exists within the bound.
    Exhausted,
    IterationCap,
    Cancelled,
}

/// The best solution found: its level and the canonical keys of every board on the way,
/// start excluded, solved board last.
#[derive(Debug, Clone)]
pub struct BestPath {
    pub level: u32,
    pub keys: Vec<PackedKey>,
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub termination: Termination,
    pub best: Option<BestPath>,
    pub statistics: Statistics,
}

#[derive(Debug)]
pub struct SolveReport {
    pub termination: Termination,
    pub solution: Option<Solution>,
    pub statistics: Statistics,
}

struct Node {
    key: PackedKey,
    parent: Option<usize>,
}

fn path_to(nodes: &[Node], mut index: usize) -> Vec<PackedKey> {
    let mut keys = Vec::new();
    while let Some(parent) = nodes[index].parent {
        keys.push(nodes[index].key.clone());
        index = parent;
    }
    keys.reverse();
    keys
}

/// Whether a board at `level` with lower bound `minimum_cost` can no longer beat `bound`.
fn can_prune(level: u32, minimum_cost: u32, relaxation: u32, bound: i64) -> bool {
    let level = i64::from(level);
    level >= bound || level + i64::from(minimum_cost) - i64::from(relaxation) >= bound
}

pub struct Solver<O = LogObserver, C = Never> {
    config: SolverConfig,
    observer: O,
    cancellation: C,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            observer: LogObserver,
            cancellation: Never,
        }
    }
}

impl<O: SearchObserver, C: Cancellation> Solver<O, C> {
    pub fn with_observer<P: SearchObserver>(self, observer: P) -> Solver<P, C> {
        Solver {
            config: self.config,
            observer,
            cancellation: self.cancellation,
        }
    }

    pub fn with_cancellation<D: Cancellation>(self, cancellation: D) -> Solver<O, D> {
        Solver {
            config: self.config,
            observer: self.observer,
            cancellation,
        }
    }

    /// Searches and, when a solution was found, replays it into a [`Solution`].
    pub fn solve(&mut self, initial: &Board) -> Result<SolveReport, SolverError> {
        let outcome = self.search(initial)?;
        let solution = match &outcome.best {
            Some(best) => {
                let solution = reconstruct(initial, best, &self.config)?;
                if solution.is_none() {
                    warn!(
                        level = best.level,
                        "solution could not be replayed within {} iterations",
                        self.config.reconstruct_iterations
                    );
                }
                solution
            }
            None => None,
        };
        Ok(SolveReport {
            termination: outcome.termination,
            solution,
            statistics: outcome.statistics,
        })
    }

    pub fn search(&mut self, initial: &Board) -> Result<SearchOutcome, SolverError> {
        initial.validate()?;
        let weights = self.config.weights;
        let relaxation = self.config.relaxation;
        let mut statistics = Statistics::new();

        let start = initial.clone().normalize(None)?;
        let root = PackedState::pack(&start, &weights);
        info!(
            level = root.level,
            minimum_cost = root.minimum_solution_cost,
            priority = root.priority,
            "starting search"
        );

        if root.is_solved() {
            statistics.stop();
            return Ok(SearchOutcome {
                termination: Termination::Exhausted,
                best: Some(BestPath {
                    level: root.level,
                    keys: Vec::new(),
                }),
                statistics,
            });
        }

        let mut bound = match self.config.level_cap {
            Some(cap) => i64::from(root.minimum_solution_cost) + i64::from(cap),
            None => i64::MAX,
        };
        let mut best: Option<BestPath> = None;

        let mut nodes = vec![Node {
            key: root.key.clone(),
            parent: None,
        }];
        let mut known: FxHashMap<PackedKey, u32> = FxHashMap::default();
        known.insert(root.key.clone(), root.level);
        let mut queue = OrderedQueue::new();
        queue.push(root, 0);

        let termination = loop {
            if statistics.processed >= self.config.max_iterations {
                break Termination::IterationCap;
            }
            if self.cancellation.is_cancelled() {
                info!(queued = queue.len(), "stop requested");
                break Termination::Cancelled;
            }
            let Some((state, node)) = queue.pop() else {
                break Termination::Exhausted;
            };
            // Reached again at a lower level after this entry was queued.
            if known.get(&state.key).is_some_and(|&level| level < state.level) {
                continue;
            }

            let board = state.unpack()?;
            statistics.processed += 1;
            statistics.level_mut(state.level).processed += 1;
            self.observer.on_expand(&state);
            trace!(level = state.level, priority = state.priority, "expanding");

            for mv in board.legal_moves() {
                statistics.level_mut(state.level).generated += 1;
                let child = board.child(&mv, None)?;
                if can_prune(
                    child.level(),
                    child.minimum_solution_cost(),
                    relaxation,
                    bound,
                ) {
                    trace!(%mv, level = child.level(), "pruned");
                    statistics.pruned += 1;
                    statistics.level_mut(state.level).pruned += 1;
                    continue;
                }

                let packed = PackedState::pack(&child, &weights);
                match known.get(&packed.key) {
                    Some(&seen) if seen <= packed.level => {
                        statistics.level_mut(state.level).duplicates += 1;
                        continue;
                    }
                    Some(_) => statistics.improved += 1,
                    None => {}
                }
                known.insert(packed.key.clone(), packed.level);
                nodes.push(Node {
                    key: packed.key.clone(),
                    parent: Some(node),
                });
                let index = nodes.len() - 1;

                if packed.is_solved() {
                    bound = i64::from(packed.level);
                    let keys = path_to(&nodes, index);
                    let purged = queue.purge(|queued, _| {
                        can_prune(
                            queued.level,
                            queued.minimum_solution_cost,
                            relaxation,
                            bound,
                        )
                    });
                    statistics.purged += purged as u64;
                    debug!(purged, remaining = queue.len(), "queue purged");
                    self.observer.on_solution(packed.level, keys.len(), purged);
                    best = Some(BestPath {
                        level: packed.level,
                        keys,
                    });
                    continue;
                }
                queue.push(packed, index);
            }

            let every = self.config.progress_every;
            if every != 0 && statistics.processed % every == 0 {
                statistics.queued = queue.len();
                self.observer.on_progress(&statistics);
            }
        };

        statistics.queued = queue.len();
        statistics.stop();
        self.observer.on_progress(&statistics);
        self.observer.on_finish(&statistics);
        info!(
            ?termination,
            processed = statistics.processed,
            level = best.as_ref().map(|best| best.level),
            "search finished"
        );

        Ok(SearchOutcome {
            termination,
            best,
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::board;
    use crossbeam_channel::unbounded;

    #[derive(Default)]
    struct Recorder {
        solutions: Vec<u32>,
        expanded: usize,
        progress: usize,
        summary: Option<Vec<u64>>,
    }

    impl SearchObserver for Recorder {
        fn on_progress(&mut self, _statistics: &Statistics) {
            self.progress += 1;
        }

        fn on_solution(&mut self, level: u32, _steps: usize, _purged: usize) {
            self.solutions.push(level);
        }

        fn on_expand(&mut self, _state: &PackedState) {
            self.expanded += 1;
        }

        fn on_finish(&mut self, statistics: &Statistics) {
            let processed = statistics.levels().iter().map(|level| level.processed);
            self.summary = Some(processed.collect());
        }
    }

    // hK is not safe while the spades stop at the jack, so it takes one move to free sQ.
    fn one_move_deal() -> Board {
        board([12, 11, 13, 13], "", &["sQ hK", "sK"])
    }

    #[test]
    fn pruning_predicate() {
        assert!(!can_prune(3, 4, 0, i64::MAX));
        assert!(can_prune(5, 0, 0, 5));
        assert!(can_prune(3, 2, 0, 5));
        assert!(!can_prune(3, 2, 1, 5));
        assert!(!can_prune(0, 0, 3, 1));
    }

    #[test]
    fn finds_the_single_move_solution() {
        let mut recorder = Recorder::default();
        let mut solver = Solver::new(SolverConfig::default()).with_observer(&mut recorder);
        let outcome = solver.search(&one_move_deal()).unwrap();
        assert_eq!(outcome.termination, Termination::Exhausted);
        let best = outcome.best.unwrap();
        assert_eq!(best.level, 1);
        assert_eq!(best.keys.len(), 1);
        assert_eq!(recorder.solutions, vec![1]);
        assert!(recorder.expanded >= 1);
        assert!(recorder.progress >= 1);
    }

    // The root expansion first solves at level 2 by popping sK to free sQ, then at level 1 by
    // moving sK to an empty cascade. Sending dK home from its cell is queued before either and
    // purged once the bound drops to 2.
    #[test]
    fn cheaper_solution_tightens_the_bound_and_purges() {
        let deal = board([12, 11, 12, 13], "dK", &["sQ sK", "hK"]);
        let mut recorder = Recorder::default();
        let outcome = Solver::new(SolverConfig::default())
            .with_observer(&mut recorder)
            .search(&deal)
            .unwrap();
        assert_eq!(recorder.solutions, vec![2, 1]);
        assert!(recorder.solutions.windows(2).all(|pair| pair[0] > pair[1]));
        assert_eq!(outcome.termination, Termination::Exhausted);
        assert_eq!(outcome.best.map(|best| best.level), Some(1));
        assert!(outcome.statistics.purged > 0);
        // both solutions end on the same solved board
        assert!(outcome.statistics.improved > 0);
    }

    #[test]
    fn zero_progress_interval_reports_only_at_the_end() {
        let config = SolverConfig {
            progress_every: 0,
            ..SolverConfig::default()
        };
        let mut recorder = Recorder::default();
        let outcome = Solver::new(config)
            .with_observer(&mut recorder)
            .search(&one_move_deal())
            .unwrap();
        assert_eq!(outcome.best.map(|best| best.level), Some(1));
        assert!(recorder.expanded >= 1);
        assert_eq!(recorder.progress, 1);
    }

    #[test]
    fn level_summary_is_delivered_once_the_search_ends() {
        let mut recorder = Recorder::default();
        let outcome = Solver::new(SolverConfig::default())
            .with_observer(&mut recorder)
            .search(&one_move_deal())
            .unwrap();
        let summary = recorder.summary.unwrap();
        assert_eq!(summary.iter().sum::<u64>(), outcome.statistics.processed);
        assert_eq!(summary[0], 1);
        assert!(outcome.statistics.level(0).branching() > 0.0);

        // the logging observer walks the same figures
        LogObserver.on_finish(&outcome.statistics);
    }

    #[test]
    fn solved_start_needs_no_search() {
        let solved = board([13, 13, 13, 13], "", &[]);
        let outcome = Solver::new(SolverConfig::default())
            .with_observer(Silent)
            .search(&solved)
            .unwrap();
        let best = outcome.best.unwrap();
        assert_eq!(best.level, 0);
        assert!(best.keys.is_empty());
        assert_eq!(outcome.statistics.processed, 0);
    }

    #[test]
    fn cancellation_is_polled_before_work() {
        let stop = Arc::new(AtomicBool::new(true));
        let outcome = Solver::new(SolverConfig::default())
            .with_observer(Silent)
            .with_cancellation(stop.clone())
            .search(&one_move_deal())
            .unwrap();
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert!(outcome.best.is_none());
        assert_eq!(outcome.statistics.processed, 0);

        let (sender, receiver) = unbounded();
        sender.send(SolverCommand::Stop).unwrap();
        assert!(receiver.is_cancelled());
        assert!(!receiver.is_cancelled());
        assert!(!Never.is_cancelled());
    }

    #[test]
    fn iteration_cap_stops_the_loop() {
        let config = SolverConfig {
            max_iterations: 0,
            ..SolverConfig::default()
        };
        let outcome = Solver::new(config)
            .with_observer(Silent)
            .search(&one_move_deal())
            .unwrap();
        assert_eq!(outcome.termination, Termination::IterationCap);
        assert!(outcome.best.is_none());
    }

    #[test]
    fn level_cap_bounds_the_search() {
        let capped = |cap| {
            let config = SolverConfig {
                level_cap: Some(cap),
                ..SolverConfig::default()
            };
            Solver::new(config)
                .with_observer(Silent)
                .search(&one_move_deal())
                .unwrap()
        };
        let outcome = capped(0);
        assert_eq!(outcome.termination, Termination::Exhausted);
        assert!(outcome.best.is_none());
        assert!(outcome.statistics.pruned > 0);

        assert_eq!(capped(2).best.map(|best| best.level), Some(1));
    }

    #[test]
    fn invalid_deals_never_start() {
        let broken = board([12, 11, 13, 13], "", &["sQ hK"]);
        let result = Solver::new(SolverConfig::default())
            .with_observer(Silent)
            .search(&broken);
        assert!(matches!(result, Err(SolverError::InvalidDeal(_))));
    }
}
