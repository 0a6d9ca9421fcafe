//! This module contains the [KillerConstraint], which restricts the digits of
//! a region to those combinations of distinct digits that add up to the
//! cage's total. It is re-exported in the
//! [constraint](crate::constraint) module, so it does not have to be
//! referenced from this module directly.

use crate::error::{SudokuError, SudokuResult};
use crate::util::DigitSet;

/// A sum constraint on a region of distinct digits. The constraint tracks all
/// combinations of `size` distinct digits that sum to `total` and have not yet
/// been ruled out. From them it derives which digits are allowed in the
/// region (those used by at least one combination) and which are confirmed
/// (those used by every combination).
///
/// As an example, a cage of two cells with a total of 4 in a Sudoku with
/// digits from 1 to 4 only has the combination `{1,3}`, so both 1 and 3 are
/// confirmed and 2 and 4 are not allowed.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct KillerConstraint {
    total: usize,
    size: usize,
    combinations: Vec<DigitSet>
}

fn combinations_rec(start: usize, max_digit: usize, remaining_cells: usize,
        remaining_sum: usize, current: DigitSet,
        result: &mut Vec<DigitSet>) {
    if remaining_cells == 0 {
        if remaining_sum == 0 {
            result.push(current);
        }

        return;
    }

    for digit in start..=max_digit {
        if digit > remaining_sum {
            // Digits are ascending, so all following ones exceed the sum too.
            break;
        }

        // The smallest possible completion uses the next consecutive digits.
        let min_rest = (remaining_cells - 1) * (2 * digit + remaining_cells) / 2;

        if digit + min_rest > remaining_sum {
            break;
        }

        let mut next = current;
        next.insert(digit);
        combinations_rec(digit + 1, max_digit, remaining_cells - 1,
            remaining_sum - digit, next, result);
    }
}

/// Recursively assigns the digits of one combination to the cells in order
/// and enters every digit that is part of a complete assignment into
/// `new_options`.
///
/// # Arguments
///
/// * `options`: A [DigitSet] for each cell of the cage containing its options.
/// * `remaining`: The digits of the combination that are not yet used by
/// previous cells.
/// * `new_options`: One [DigitSet] for each cell (same indices as `options`),
/// into which all digits that appear in a valid assignment are entered.
/// * `index`: The index of the cell to process at this recursion depth.
fn find_placements_rec(options: &[DigitSet], remaining: DigitSet,
        new_options: &mut Vec<DigitSet>, index: usize) -> bool {
    if index == options.len() {
        return true;
    }

    let mut result = false;

    for digit in (options[index] & remaining).iter() {
        let mut next = remaining;
        next.remove(digit);

        if find_placements_rec(options, next, new_options, index + 1) {
            new_options[index].insert(digit);
            result = true;
        }
    }

    result
}

impl KillerConstraint {

    /// Creates a new killer constraint for a cage of `size` cells with the
    /// given `total`, where every cell contains a digit from 1 to
    /// `max_digit`.
    ///
    /// # Errors
    ///
    /// `SudokuError::InvalidCageTotal` if no combination of `size` distinct
    /// digits in the range reaches `total`.
    pub fn new(total: usize, size: usize, max_digit: usize)
            -> SudokuResult<KillerConstraint> {
        if size == 0 || size > max_digit {
            return Err(SudokuError::InvalidCageTotal);
        }

        let mut combinations = Vec::new();
        combinations_rec(1, max_digit, size, total, DigitSet::new(),
            &mut combinations);

        if combinations.is_empty() {
            Err(SudokuError::InvalidCageTotal)
        }
        else {
            Ok(KillerConstraint {
                total,
                size,
                combinations
            })
        }
    }

    /// Gets the total which the digits of the cage must add up to.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Gets the number of cells in the cage.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Gets all combinations which have not been ruled out yet, in ascending
    /// lexicographic order.
    pub fn combinations(&self) -> &[DigitSet] {
        &self.combinations
    }

    /// Indicates whether every combination has been ruled out, which means
    /// the puzzle is broken.
    pub fn is_broken(&self) -> bool {
        self.combinations.is_empty()
    }

    /// Gets the digits which appear in at least one remaining combination.
    pub fn allowed(&self) -> DigitSet {
        self.combinations.iter()
            .fold(DigitSet::new(), |acc, &c| acc | c)
    }

    /// Gets the digits which appear in every remaining combination. If no
    /// combination remains, this is empty.
    pub fn confirmed(&self) -> DigitSet {
        let mut iter = self.combinations.iter();

        match iter.next() {
            Some(&first) => iter.fold(first, |acc, &c| acc & c),
            None => DigitSet::new()
        }
    }

    /// Removes every combination that contains `digit`. Returns `true` if
    /// any combination was removed.
    pub fn disallow(&mut self, digit: usize) -> bool {
        let before = self.combinations.len();
        self.combinations.retain(|c| !c.contains(digit));
        before != self.combinations.len()
    }

    /// Removes every combination that does not contain `digit`. Returns
    /// `true` if any combination was removed.
    pub fn require(&mut self, digit: usize) -> bool {
        let before = self.combinations.len();
        self.combinations.retain(|c| c.contains(digit));
        before != self.combinations.len()
    }

    /// Keeps only the combinations which use no digit outside `allowed` and
    /// every digit of `confirmed`. Returns `true` if any combination was
    /// removed.
    pub fn restrict(&mut self, allowed: DigitSet, confirmed: DigitSet)
            -> bool {
        let before = self.combinations.len();
        self.combinations.retain(|&c|
            c.is_subset(allowed) && confirmed.is_subset(c));
        before != self.combinations.len()
    }

    /// Derives the constraint for the remaining cells of this cage after a
    /// subset of its cells has been found to contain exactly `digits`. The
    /// result keeps the combinations containing all of `digits`, with these
    /// removed, and has a total reduced by their sum.
    pub fn split_off(&self, digits: DigitSet) -> KillerConstraint {
        let combinations = self.combinations.iter()
            .filter(|&&c| digits.is_subset(c))
            .map(|&c| c - digits)
            .collect();

        KillerConstraint {
            total: self.total.saturating_sub(digits.sum()),
            size: self.size.saturating_sub(digits.len()),
            combinations
        }
    }

    /// Searches for every complete assignment of the remaining combinations
    /// to cells with the given `options` (one entry per cell of the cage).
    /// Combinations that cannot be placed at all are removed. Returns, for
    /// every cell, the digits that appear in at least one placement, together
    /// with a flag indicating whether any combination was removed.
    pub fn find_placements(&mut self, options: &[DigitSet])
            -> (Vec<DigitSet>, bool) {
        let mut new_options = vec![DigitSet::new(); options.len()];

        if options.len() != self.size {
            return (options.to_vec(), false);
        }

        let before = self.combinations.len();
        self.combinations.retain(|&combination|
            find_placements_rec(options, combination, &mut new_options, 0));

        (new_options, before != self.combinations.len())
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn digits(v: &[usize]) -> DigitSet {
        v.iter().cloned().collect()
    }

    #[test]
    fn combinations_are_increasing_subsets_with_the_total() {
        let killer = KillerConstraint::new(10, 3, 9).unwrap();
        let expected = vec![
            digits(&[1, 2, 7]),
            digits(&[1, 3, 6]),
            digits(&[1, 4, 5]),
            digits(&[2, 3, 5])
        ];

        assert_eq!(expected, killer.combinations());
        assert_eq!(digits(&[1, 2, 3, 4, 5, 6, 7]), killer.allowed());
        assert!(killer.confirmed().is_empty());
    }

    #[test]
    fn combinations_cover_all_subsets_in_small_alphabet() {
        for total in 0..=20 {
            for size in 1..=4 {
                let expected = (1..16u64)
                    .map(|bits| (1..=4usize)
                        .filter(|d| bits & (1 << (d - 1)) != 0)
                        .collect::<DigitSet>())
                    .filter(|c| c.len() == size && c.sum() == total)
                    .count();
                let actual = KillerConstraint::new(total, size, 4)
                    .map(|k| k.combinations().len())
                    .unwrap_or(0);

                assert_eq!(expected, actual,
                    "total {} size {}", total, size);
            }
        }
    }

    #[test]
    fn unreachable_total_is_rejected() {
        assert_eq!(Err(SudokuError::InvalidCageTotal),
            KillerConstraint::new(17, 2, 4));
        assert_eq!(Err(SudokuError::InvalidCageTotal),
            KillerConstraint::new(2, 2, 4));
        assert_eq!(Err(SudokuError::InvalidCageTotal),
            KillerConstraint::new(5, 5, 4));
    }

    #[test]
    fn single_combination_confirms_all_digits() {
        let killer = KillerConstraint::new(3, 2, 4).unwrap();
        assert_eq!(digits(&[1, 2]), killer.allowed());
        assert_eq!(digits(&[1, 2]), killer.confirmed());
    }

    #[test]
    fn disallow_only_removes_combinations_with_digit() {
        let mut killer = KillerConstraint::new(10, 3, 9).unwrap();
        assert!(killer.disallow(7));
        assert!(killer.combinations().iter().all(|c| !c.contains(7)));
        assert_eq!(3, killer.combinations().len());
        assert!(!killer.disallow(7));
        assert!(!killer.disallow(9));
    }

    #[test]
    fn require_keeps_combinations_with_digit() {
        let mut killer = KillerConstraint::new(10, 3, 9).unwrap();
        assert!(killer.require(5));
        assert_eq!(vec![digits(&[1, 4, 5]), digits(&[2, 3, 5])],
            killer.combinations());
        assert_eq!(digits(&[5]), killer.confirmed());
    }

    #[test]
    fn split_off_reduces_total_and_size() {
        let killer = KillerConstraint::new(10, 3, 9).unwrap();
        let rest = killer.split_off(digits(&[1]));

        assert_eq!(9, rest.total());
        assert_eq!(2, rest.size());
        assert_eq!(vec![digits(&[2, 7]), digits(&[3, 6]), digits(&[4, 5])],
            rest.combinations());
    }

    #[test]
    fn placements_respect_cell_options() {
        // Cage of 3 cells summing to 8 in a 1-4 alphabet: only {1,3,4}.
        let mut killer = KillerConstraint::new(8, 3, 4).unwrap();
        let options = vec![
            digits(&[1, 3]),
            digits(&[1, 3]),
            digits(&[1, 2, 3, 4])
        ];
        let (new_options, removed) = killer.find_placements(&options);

        assert!(!removed);
        assert_eq!(vec![digits(&[1, 3]), digits(&[1, 3]), digits(&[4])],
            new_options);
    }

    #[test]
    fn placements_remove_unplaceable_combinations() {
        let mut killer = KillerConstraint::new(5, 2, 4).unwrap();
        let options = vec![digits(&[1, 2]), digits(&[1, 2, 3])];
        let (new_options, removed) = killer.find_placements(&options);

        assert!(removed);
        assert_eq!(vec![digits(&[2, 3])], killer.combinations());
        assert_eq!(vec![digits(&[2]), digits(&[3])], new_options);
    }
}
