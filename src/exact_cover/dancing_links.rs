//! This module contains [DancingLinks], an implementation of Knuth's
//! Algorithm X on a doubly linked sparse matrix. The nodes are stored in a
//! single arena and link to each other by index.

use log::trace;

use std::sync::atomic::{AtomicBool, Ordering};

const ROOT: usize = 0;

#[derive(Clone, Copy, Debug)]
struct Node {
    left: usize,
    right: usize,
    up: usize,
    down: usize,
    column: usize,
    row: usize
}

/// The result of a search of a [DancingLinks] matrix.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchResult {

    /// The found solutions, each as the list of the chosen row indices in the
    /// order in which they were chosen.
    pub solutions: Vec<Vec<usize>>,

    /// Whether [SearchResult::solutions] contains every solution. This is
    /// `false` if another solution beyond the maximum was found or the search
    /// was aborted.
    pub complete: bool,

    /// Whether the search was aborted through the abort flag.
    pub aborted: bool
}

struct SearchState<'a> {
    max_solutions: usize,
    abort: &'a AtomicBool,
    partial: Vec<usize>,
    result: SearchResult,
    limited: bool
}

impl<'a> SearchState<'a> {
    fn should_stop(&mut self) -> bool {
        if self.limited || self.result.aborted {
            return true;
        }

        if self.abort.load(Ordering::Relaxed) {
            self.result.aborted = true;
            return true;
        }

        false
    }
}

/// A sparse 0/1 matrix for exact cover problems with primary and secondary
/// columns. A solution is a set of rows that covers every primary column
/// exactly once and every secondary column at most once.
///
/// Columns are numbered from 0, with the primary columns first. Rows are
/// numbered in the order in which they were added.
///
/// ```
/// use sudoku_regions::exact_cover::dancing_links::DancingLinks;
/// use std::sync::atomic::AtomicBool;
///
/// let mut matrix = DancingLinks::new(3, 0);
/// matrix.add_row(&[0, 1]);
/// matrix.add_row(&[2]);
/// matrix.add_row(&[1, 2]);
/// matrix.add_row(&[0]);
///
/// let result = matrix.search(usize::MAX, &AtomicBool::new(false));
///
/// assert_eq!(2, result.solutions.len());
/// assert!(result.complete);
/// ```
#[derive(Clone, Debug)]
pub struct DancingLinks {
    nodes: Vec<Node>,
    sizes: Vec<usize>,
    primary: usize,
    rows: usize
}

impl DancingLinks {

    /// Creates a new matrix without rows with the given number of primary and
    /// secondary columns.
    pub fn new(primary: usize, secondary: usize) -> DancingLinks {
        let columns = primary + secondary;
        let mut nodes = Vec::with_capacity(columns + 1);

        for index in 0..=columns {
            nodes.push(Node {
                left: index,
                right: index,
                up: index,
                down: index,
                column: index,
                row: usize::MAX
            });
        }

        // Only primary headers are linked into the root list.
        for index in 0..=primary {
            nodes[index].left = if index == 0 { primary } else { index - 1 };
            nodes[index].right = if index == primary { ROOT } else { index + 1 };
        }

        DancingLinks {
            nodes,
            sizes: vec![0; columns + 1],
            primary,
            rows: 0
        }
    }

    /// Gets the number of primary columns.
    pub fn primary_columns(&self) -> usize {
        self.primary
    }

    /// Gets the total number of columns.
    pub fn columns(&self) -> usize {
        self.sizes.len() - 1
    }

    /// Gets the number of rows added so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Adds a row with ones in the given columns and returns its index. Rows
    /// without columns are counted, but can never be part of a solution.
    ///
    /// # Panics
    ///
    /// If any column is out of range.
    pub fn add_row(&mut self, columns: &[usize]) -> usize {
        let row = self.rows;
        self.rows += 1;
        let first = self.nodes.len();

        for (offset, &column) in columns.iter().enumerate() {
            assert!(column < self.columns(), "column out of range");

            let header = column + 1;
            let index = first + offset;
            let up = self.nodes[header].up;
            let left = if offset == 0 { index } else { index - 1 };

            self.nodes.push(Node {
                left,
                right: first,
                up,
                down: header,
                column: header,
                row
            });
            self.nodes[up].down = index;
            self.nodes[header].up = index;
            self.nodes[left].right = index;
            self.nodes[first].left = index;
            self.sizes[header] += 1;
        }

        row
    }

    fn cover(&mut self, column: usize) {
        let Node { left, right, .. } = self.nodes[column];
        self.nodes[left].right = right;
        self.nodes[right].left = left;
        let mut i = self.nodes[column].down;

        while i != column {
            let mut j = self.nodes[i].right;

            while j != i {
                let Node { up, down, column: c, .. } = self.nodes[j];
                self.nodes[up].down = down;
                self.nodes[down].up = up;
                self.sizes[c] -= 1;
                j = self.nodes[j].right;
            }

            i = self.nodes[i].down;
        }
    }

    fn uncover(&mut self, column: usize) {
        let mut i = self.nodes[column].up;

        while i != column {
            let mut j = self.nodes[i].left;

            while j != i {
                let Node { up, down, column: c, .. } = self.nodes[j];
                self.sizes[c] += 1;
                self.nodes[up].down = j;
                self.nodes[down].up = j;
                j = self.nodes[j].left;
            }

            i = self.nodes[i].up;
        }

        let Node { left, right, .. } = self.nodes[column];
        self.nodes[left].right = column;
        self.nodes[right].left = column;
    }

    fn choose_column(&self) -> usize {
        let mut best = self.nodes[ROOT].right;
        let mut column = best;

        while column != ROOT {
            if self.sizes[column] < self.sizes[best] {
                best = column;

                if self.sizes[best] == 0 {
                    break;
                }
            }

            column = self.nodes[column].right;
        }

        best
    }

    fn search_rec(&mut self, state: &mut SearchState<'_>) {
        if state.should_stop() {
            return;
        }

        if self.nodes[ROOT].right == ROOT {
            if state.result.solutions.len() >= state.max_solutions {
                state.limited = true;
                return;
            }

            let solution = state.partial.iter()
                .map(|&node| self.nodes[node].row)
                .collect();
            state.result.solutions.push(solution);
            return;
        }

        let column = self.choose_column();

        if self.sizes[column] == 0 {
            return;
        }

        self.cover(column);
        let mut row = self.nodes[column].down;

        while row != column {
            state.partial.push(row);
            let mut j = self.nodes[row].right;

            while j != row {
                self.cover(self.nodes[j].column);
                j = self.nodes[j].right;
            }

            self.search_rec(state);
            j = self.nodes[row].left;

            while j != row {
                self.uncover(self.nodes[j].column);
                j = self.nodes[j].left;
            }

            state.partial.pop();

            if state.should_stop() {
                break;
            }

            row = self.nodes[row].down;
        }

        self.uncover(column);
    }

    /// Searches for up to `max_solutions` exact covers. Once the maximum is
    /// reached, the search continues until it finds one more cover, which is
    /// not returned, so that [SearchResult::complete] is exact. The abort
    /// flag is checked at every node of the search tree, and the search
    /// returns as soon as it is set. The matrix is left unchanged.
    pub fn search(&mut self, max_solutions: usize, abort: &AtomicBool)
            -> SearchResult {
        let mut state = SearchState {
            max_solutions,
            abort,
            partial: Vec::new(),
            result: SearchResult::default(),
            limited: false
        };

        self.search_rec(&mut state);
        state.result.complete = !state.limited && !state.result.aborted;

        trace!(target: "exact_cover", "search over {} rows found {} solutions",
            self.rows, state.result.solutions.len());
        state.result
    }
}
