//! This module contains utility functionality needed for this crate. Most
//! prominently, it contains the definitions of [DigitSet], which stores cell
//! options and region values, and [CellSet], which stores groups of cells by
//! their linear id.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::hash::Hash;
use std::iter::FromIterator;
use std::ops::{
    BitAnd,
    BitAndAssign,
    BitOr,
    BitOrAssign,
    Sub,
    SubAssign
};

/// The largest digit a [DigitSet] can hold. Grids are therefore limited to a
/// size of 63.
pub const MAX_DIGIT: usize = 63;

/// A set of digits implemented as a single bit mask, where bit `d` represents
/// the digit `d`. Since it is `Copy`, it is cheap to pass around and to store
/// in large numbers, e.g. one per cell and one per killer cage combination.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DigitSet(u64);

/// An iterator over the digits of a [DigitSet] in ascending order.
pub struct DigitSetIter {
    bits: u64
}

impl Iterator for DigitSetIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.bits == 0 {
            None
        }
        else {
            let digit = self.bits.trailing_zeros() as usize;
            self.bits &= self.bits - 1;
            Some(digit)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.bits.count_ones() as usize;
        (len, Some(len))
    }
}

impl DigitSet {

    /// Creates a new, empty digit set.
    pub fn new() -> DigitSet {
        DigitSet(0)
    }

    /// Creates a digit set containing all digits from 1 to `max`
    /// (inclusive). `max` is clamped to [MAX_DIGIT].
    pub fn range(max: usize) -> DigitSet {
        let max = max.min(MAX_DIGIT);

        if max == 0 {
            DigitSet(0)
        }
        else {
            DigitSet(((1u64 << max) - 1) << 1)
        }
    }

    /// Creates a digit set which only contains `digit`. Digits outside
    /// `1..=MAX_DIGIT` yield an empty set.
    pub fn singleton(digit: usize) -> DigitSet {
        let mut set = DigitSet::new();
        set.insert(digit);
        set
    }

    /// Gets the raw bit mask, where bit `d` stands for digit `d`.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Indicates whether this set contains the given digit.
    pub fn contains(self, digit: usize) -> bool {
        digit >= 1 && digit <= MAX_DIGIT && self.0 & (1u64 << digit) != 0
    }

    /// Inserts `digit` and returns `true` if the set changed. Digits outside
    /// `1..=MAX_DIGIT` are ignored.
    pub fn insert(&mut self, digit: usize) -> bool {
        if digit == 0 || digit > MAX_DIGIT {
            return false;
        }

        let before = self.0;
        self.0 |= 1u64 << digit;
        before != self.0
    }

    /// Removes `digit` and returns `true` if the set changed.
    pub fn remove(&mut self, digit: usize) -> bool {
        if digit == 0 || digit > MAX_DIGIT {
            return false;
        }

        let before = self.0;
        self.0 &= !(1u64 << digit);
        before != self.0
    }

    /// Returns the number of digits in this set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Indicates whether this set contains no digits.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns an iterator over the contained digits in ascending order.
    pub fn iter(self) -> DigitSetIter {
        DigitSetIter {
            bits: self.0
        }
    }

    /// Returns the smallest contained digit, if any.
    pub fn min(self) -> Option<usize> {
        self.iter().next()
    }

    /// Returns the largest contained digit, if any.
    pub fn max(self) -> Option<usize> {
        if self.0 == 0 {
            None
        }
        else {
            Some(63 - self.0.leading_zeros() as usize)
        }
    }

    /// Returns the sum of all contained digits.
    pub fn sum(self) -> usize {
        self.iter().sum()
    }

    /// Indicates whether every digit of this set is also contained in
    /// `other`.
    pub fn is_subset(self, other: DigitSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Indicates whether this set and `other` have no digit in common.
    pub fn is_disjoint(self, other: DigitSet) -> bool {
        self.0 & other.0 == 0
    }

    /// Computes the union of this set and `other`.
    pub fn union(self, other: DigitSet) -> DigitSet {
        DigitSet(self.0 | other.0)
    }

    /// Computes the intersection of this set and `other`.
    pub fn intersect(self, other: DigitSet) -> DigitSet {
        DigitSet(self.0 & other.0)
    }

    /// Computes the set of digits in this set that are not in `other`.
    pub fn difference(self, other: DigitSet) -> DigitSet {
        DigitSet(self.0 & !other.0)
    }
}

impl FromIterator<usize> for DigitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> DigitSet {
        let mut set = DigitSet::new();

        for digit in iter {
            set.insert(digit);
        }

        set
    }
}

impl Display for DigitSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;

        for (i, digit) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }

            write!(f, "{}", digit)?;
        }

        f.write_str("}")
    }
}

impl BitOr for DigitSet {
    type Output = DigitSet;

    fn bitor(self, rhs: DigitSet) -> DigitSet {
        self.union(rhs)
    }
}

impl BitAnd for DigitSet {
    type Output = DigitSet;

    fn bitand(self, rhs: DigitSet) -> DigitSet {
        self.intersect(rhs)
    }
}

impl Sub for DigitSet {
    type Output = DigitSet;

    fn sub(self, rhs: DigitSet) -> DigitSet {
        self.difference(rhs)
    }
}

impl BitOrAssign for DigitSet {
    fn bitor_assign(&mut self, rhs: DigitSet) {
        self.0 |= rhs.0;
    }
}

impl BitAndAssign for DigitSet {
    fn bitand_assign(&mut self, rhs: DigitSet) {
        self.0 &= rhs.0;
    }
}

impl SubAssign for DigitSet {
    fn sub_assign(&mut self, rhs: DigitSet) {
        self.0 &= !rhs.0;
    }
}

/// A set of cells, identified by their linear id (`row * size + column`),
/// implemented as a bit vector. All cell sets that are compared or combined
/// with each other must be created with the same capacity, which is the number
/// of cells in the grid.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CellSet {
    words: Vec<u64>
}

/// An iterator over the cell ids contained in a [CellSet] in ascending order.
pub struct CellSetIter<'a> {
    words: &'a [u64],
    word_index: usize,
    current: u64
}

impl<'a> Iterator for CellSetIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.word_index * 64 + bit);
            }

            self.word_index += 1;

            if self.word_index >= self.words.len() {
                return None;
            }

            self.current = self.words[self.word_index];
        }
    }
}

impl CellSet {

    /// Creates an empty cell set that can hold cell ids in `0..capacity`.
    pub fn new(capacity: usize) -> CellSet {
        CellSet {
            words: vec![0u64; (capacity + 63) >> 6]
        }
    }

    /// Creates a cell set with the given capacity containing all given cells.
    /// Ids beyond the capacity are ignored.
    pub fn from_cells<I>(capacity: usize, cells: I) -> CellSet
    where
        I: IntoIterator<Item = usize>
    {
        let mut set = CellSet::new(capacity);

        for cell in cells {
            set.insert(cell);
        }

        set
    }

    /// Indicates whether the cell with the given id is contained.
    pub fn contains(&self, cell: usize) -> bool {
        self.words.get(cell >> 6)
            .map(|w| w & (1u64 << (cell & 63)) != 0)
            .unwrap_or(false)
    }

    /// Inserts the given cell and returns `true` if the set changed.
    pub fn insert(&mut self, cell: usize) -> bool {
        if let Some(word) = self.words.get_mut(cell >> 6) {
            let before = *word;
            *word |= 1u64 << (cell & 63);
            before != *word
        }
        else {
            false
        }
    }

    /// Removes the given cell and returns `true` if the set changed.
    pub fn remove(&mut self, cell: usize) -> bool {
        if let Some(word) = self.words.get_mut(cell >> 6) {
            let before = *word;
            *word &= !(1u64 << (cell & 63));
            before != *word
        }
        else {
            false
        }
    }

    /// Removes all cells from this set.
    pub fn clear(&mut self) {
        for word in self.words.iter_mut() {
            *word = 0;
        }
    }

    /// Returns the number of contained cells.
    pub fn len(&self) -> usize {
        self.words.iter()
            .map(|w| w.count_ones() as usize)
            .sum()
    }

    /// Indicates whether this set contains no cells.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns an iterator over the contained cell ids in ascending order.
    pub fn iter(&self) -> CellSetIter<'_> {
        CellSetIter {
            words: &self.words,
            word_index: 0,
            current: self.words.first().cloned().unwrap_or(0)
        }
    }

    /// Indicates whether every cell of this set is also contained in `other`.
    pub fn is_subset(&self, other: &CellSet) -> bool {
        self.words.iter()
            .zip(other.words.iter().chain(std::iter::repeat(&0)))
            .all(|(a, b)| a & !b == 0)
    }

    /// Indicates whether this set and `other` share no cell.
    pub fn is_disjoint(&self, other: &CellSet) -> bool {
        self.words.iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & b == 0)
    }

    /// Adds all cells of `other` to this set and returns `true` if this set
    /// changed.
    pub fn union_assign(&mut self, other: &CellSet) -> bool {
        self.op_assign(other, |a, b| a | b)
    }

    /// Removes all cells not contained in `other` from this set and returns
    /// `true` if this set changed.
    pub fn intersect_assign(&mut self, other: &CellSet) -> bool {
        self.op_assign(other, |a, b| a & b)
    }

    /// Removes all cells contained in `other` from this set and returns
    /// `true` if this set changed.
    pub fn difference_assign(&mut self, other: &CellSet) -> bool {
        self.op_assign(other, |a, b| a & !b)
    }

    /// Computes the union of this set and `other`.
    pub fn union(&self, other: &CellSet) -> CellSet {
        let mut result = self.clone();
        result.union_assign(other);
        result
    }

    /// Computes the intersection of this set and `other`.
    pub fn intersect(&self, other: &CellSet) -> CellSet {
        let mut result = self.clone();
        result.intersect_assign(other);
        result
    }

    /// Computes the set of cells in this set that are not in `other`.
    pub fn difference(&self, other: &CellSet) -> CellSet {
        let mut result = self.clone();
        result.difference_assign(other);
        result
    }

    fn op_assign(&mut self, other: &CellSet, op: impl Fn(u64, u64) -> u64)
            -> bool {
        let mut changed = false;

        for (i, word) in self.words.iter_mut().enumerate() {
            let other_word = other.words.get(i).cloned().unwrap_or(0);
            let before = *word;
            *word = op(before, other_word);
            changed |= before != *word;
        }

        changed
    }
}

/// Determines whether the given iterator contains at least two equal elements
/// as defined by the [Eq](std::cmp::Eq) trait.
pub(crate) fn contains_duplicate<I>(mut iter: I) -> bool
where
    I: Iterator,
    I::Item: Hash + Eq
{
    let mut set = HashSet::new();
    iter.any(|e| !set.insert(e))
}

/// Calls `visit` with every `k`-element combination of `items` (as index
/// lists into `items`, in lexicographic order). If `visit` returns `false`,
/// enumeration stops early. Returns `false` if it was stopped.
pub(crate) fn for_each_combination<F>(len: usize, k: usize, mut visit: F)
    -> bool
where
    F: FnMut(&[usize]) -> bool
{
    if k > len {
        return true;
    }

    let mut indices: Vec<usize> = (0..k).collect();

    loop {
        if !visit(&indices) {
            return false;
        }

        let mut i = k;

        loop {
            if i == 0 {
                return true;
            }

            i -= 1;

            if indices[i] != i + len - k {
                break;
            }

            if i == 0 {
                return true;
            }
        }

        indices[i] += 1;

        for j in (i + 1)..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn range_contains_exactly_the_digits() {
        let set = DigitSet::range(9);
        assert_eq!(9, set.len());
        assert!(!set.contains(0));
        assert!(set.contains(1));
        assert!(set.contains(9));
        assert!(!set.contains(10));
        assert_eq!(45, set.sum());
    }

    #[test]
    fn digit_set_manipulation() {
        let mut set = DigitSet::new();
        assert!(set.insert(3));
        assert!(set.insert(7));
        assert!(!set.insert(3));
        assert!(!set.insert(0));
        assert_eq!(2, set.len());
        assert_eq!(Some(3), set.min());
        assert_eq!(Some(7), set.max());

        assert!(set.remove(3));
        assert!(!set.remove(3));
        assert_eq!(vec![7], set.iter().collect::<Vec<_>>());
    }

    #[test]
    fn digit_set_operations() {
        let a: DigitSet = vec![1, 2, 4].into_iter().collect();
        let b: DigitSet = vec![2, 3, 4].into_iter().collect();

        assert_eq!(vec![1, 2, 3, 4], (a | b).iter().collect::<Vec<_>>());
        assert_eq!(vec![2, 4], (a & b).iter().collect::<Vec<_>>());
        assert_eq!(vec![1], (a - b).iter().collect::<Vec<_>>());
        assert!((a & b).is_subset(a));
        assert!(!a.is_subset(b));
        assert!(DigitSet::singleton(1).is_disjoint(b));
        assert_eq!("{1,2,4}", a.to_string());
    }

    #[test]
    fn cell_set_iteration_crosses_words() {
        let set = CellSet::from_cells(81, vec![0, 5, 63, 64, 80]);
        assert_eq!(5, set.len());
        assert_eq!(vec![0, 5, 63, 64, 80], set.iter().collect::<Vec<_>>());
        assert!(set.contains(64));
        assert!(!set.contains(65));
    }

    #[test]
    fn cell_set_relations() {
        let a = CellSet::from_cells(81, vec![1, 2, 70]);
        let b = CellSet::from_cells(81, vec![1, 2, 3, 70]);
        let c = CellSet::from_cells(81, vec![4, 71]);

        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(a.is_disjoint(&c));
        assert_eq!(CellSet::from_cells(81, vec![3]), b.difference(&a));
        assert_eq!(a, b.intersect(&a));
        assert_eq!(6, b.union(&c).len());
    }

    #[test]
    fn combinations_are_enumerated_in_order() {
        let mut result = Vec::new();
        for_each_combination(4, 2, |c| {
            result.push(c.to_vec());
            true
        });

        assert_eq!(vec![
            vec![0, 1], vec![0, 2], vec![0, 3],
            vec![1, 2], vec![1, 3], vec![2, 3]
        ], result);
    }

    #[test]
    fn combinations_stop_early() {
        let mut count = 0;
        let finished = for_each_combination(5, 3, |_| {
            count += 1;
            count < 4
        });

        assert!(!finished);
        assert_eq!(4, count);
    }

    #[test]
    fn contains_duplicate_detects_repeats() {
        assert!(!contains_duplicate(vec![1, 5, 2].iter()));
        assert!(contains_duplicate(vec![1, 5, 1].iter()));
    }
}
