use std::fmt::Write;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::board::Board;
use crate::config::{SolverConfig, Weights};
use crate::error::InvariantError;
use crate::moves::{Journal, MoveDescription};
use crate::packed::{PackedKey, PackedState};
use crate::queue::OrderedQueue;
use crate::search::BestPath;

/// The transfers that lead to `board`, in the order they were made.
#[derive(Debug, Clone)]
pub struct SolutionStep {
    pub moves: Vec<MoveDescription>,
    pub board: Board,
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub initial: Board,
    pub steps: Vec<SolutionStep>,
    /// Player moves the solution takes.
    pub level: u32,
}

impl Solution {
    /// Player moves described by the steps; automatic foundation moves count 0.
    pub fn move_count(&self) -> u32 {
        self.steps
            .iter()
            .flat_map(|step| &step.moves)
            .map(|description| description.increment)
            .sum()
    }

    pub fn final_board(&self) -> &Board {
        self.steps.last().map_or(&self.initial, |step| &step.board)
    }

    /// The full write-up: the start position, then every move numbered by the player move it
    /// completes, with the board after each step. A line that doesn't advance the count (an
    /// automatic move) leaves the number blank.
    pub fn report(&self, weights: &Weights) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}\n", self.initial.describe(weights));

        let mut previous = 0;
        let mut count = 0;
        for step in &self.steps {
            for description in &step.moves {
                let shown = description.increment.min(1);
                count += shown;
                let number = if count != previous {
                    count.to_string()
                } else {
                    String::new()
                };
                let _ = writeln!(out, "[{:>3}] {}", number, description.text);
                previous = count;
                count += description.increment - shown;
            }
            let _ = writeln!(out, "{}\n", step.board.describe(weights));
        }
        out
    }
}

struct Step {
    parent: Option<usize>,
    moves: Vec<MoveDescription>,
    board: Board,
}

/// Replays a solution found by the search: a second, narrow search from `initial` that only
/// admits boards on `path`, keeping the descriptions of every transfer. Returns `None` when no
/// solved board is reached within `reconstruct_iterations` expansions.
pub fn reconstruct(
    initial: &Board,
    path: &BestPath,
    config: &SolverConfig,
) -> Result<Option<Solution>, InvariantError> {
    let weights = &config.weights;
    let on_path: FxHashSet<&PackedKey> = path.keys.iter().collect();

    let mut journal = Journal::new();
    let start = initial.clone().normalize(Some(&mut journal))?;
    let mut steps = vec![Step {
        parent: None,
        moves: journal.into_entries(),
        board: start,
    }];

    let mut solved = if steps[0].board.is_solved() {
        Some((steps[0].board.priority(weights), 0))
    } else {
        None
    };
    let mut known: FxHashMap<PackedKey, i64> = FxHashMap::default();
    let mut queue = OrderedQueue::new();
    queue.push(steps[0].board.priority(weights), 0);

    for _ in 0..config.reconstruct_iterations {
        let Some((_, current)) = queue.pop() else {
            break;
        };
        for mv in steps[current].board.legal_moves() {
            let mut journal = Journal::new();
            let child = steps[current].board.child(&mv, Some(&mut journal))?;
            let packed = PackedState::pack(&child, weights);
            if !on_path.contains(&packed.key) {
                continue;
            }
            if known
                .get(&packed.key)
                .is_some_and(|&priority| priority <= packed.priority)
            {
                continue;
            }
            known.insert(packed.key.clone(), packed.priority);

            steps.push(Step {
                parent: Some(current),
                moves: journal.into_entries(),
                board: child,
            });
            let index = steps.len() - 1;
            if packed.is_solved() {
                if solved.map_or(true, |(priority, _)| packed.priority < priority) {
                    debug!(level = packed.level, "solution replayed");
                    solved = Some((packed.priority, index));
                }
            } else {
                queue.push(packed.priority, index);
            }
        }
    }

    let Some((_, leaf)) = solved else {
        return Ok(None);
    };
    let mut chain = Vec::new();
    let mut index = Some(leaf);
    while let Some(current) = index {
        chain.push(current);
        index = steps[current].parent;
    }
    chain.reverse();

    let level = steps[leaf].board.level();
    let mut slots: Vec<Option<Step>> = steps.into_iter().map(Some).collect();
    let steps = chain
        .into_iter()
        .filter_map(|index| slots[index].take())
        // The start only shows up when it needed automatic moves.
        .filter(|step| step.parent.is_some() || !step.moves.is_empty())
        .map(|step| SolutionStep {
            moves: step.moves,
            board: step.board,
        })
        .collect();

    Ok(Some(Solution {
        initial: initial.clone(),
        steps,
        level,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::board;
    use crate::search::{Silent, Solver};

    fn solve(initial: &Board) -> Solution {
        Solver::new(SolverConfig::default())
            .with_observer(Silent)
            .solve(initial)
            .unwrap()
            .solution
            .unwrap()
    }

    #[test]
    fn single_move_report() {
        let initial = board([12, 11, 13, 13], "", &["sQ hK", "sK"]);
        let solution = solve(&initial);
        assert_eq!(solution.level, 1);
        assert_eq!(solution.move_count(), 1);
        assert_eq!(solution.steps.len(), 1);
        assert!(solution.final_board().is_solved());

        let moves = &solution.steps[0].moves;
        assert_eq!(moves[0].increment, 1);
        assert!(moves[1..].iter().all(|description| description.increment == 0));
        assert!(moves[1..]
            .iter()
            .all(|description| description.text.ends_with(" (*)")));

        let report = solution.report(&Weights::default());
        let numbered: Vec<&str> = report.lines().filter(|line| line.starts_with('[')).collect();
        assert!(numbered[0].starts_with("[  1] Move the card \"hK\" from cascade 1 to its foundation."));
        assert!(numbered[1..].iter().all(|line| line.starts_with("[   ] ")));
    }

    #[test]
    fn two_move_solution() {
        // Each king sits on the queen of the other color's suit.
        let initial = board([11, 11, 13, 13], "", &["hQ sK", "sQ hK"]);
        let solution = solve(&initial);
        assert_eq!(solution.level, 2);
        assert_eq!(solution.move_count(), 2);
        assert!(solution.final_board().is_solved());
    }

    #[test]
    fn automatic_start_moves_form_their_own_step() {
        let initial = board([13, 13, 13, 11], "", &["cQ", "cK"]);
        let solution = solve(&initial);
        assert_eq!(solution.level, 0);
        assert_eq!(solution.steps.len(), 1);
        assert_eq!(solution.move_count(), 0);
        assert_eq!(solution.steps[0].moves.len(), 2);
    }

    #[test]
    fn off_path_keys_replay_nothing() {
        let initial = board([12, 11, 13, 13], "", &["sQ hK", "sK"]);
        let path = BestPath {
            level: 1,
            keys: Vec::new(),
        };
        let replay = reconstruct(&initial, &path, &SolverConfig::default()).unwrap();
        assert!(replay.is_none());
    }
}
