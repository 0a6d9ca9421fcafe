//! This module defines the variant constraints that can be attached to
//! regions, and the machinery that derives additional cages from them.
//!
//! Every region in this crate is a no-repeat region, i.e. each digit may
//! appear at most once in it. A [VariantConstraint] adds a further rule on top
//! of that, which is enforced by restricting the digits the region allows and
//! confirms. Currently, the only variant is the killer cage, represented by
//! [KillerConstraint]: the digits of the region must add up to a given total.
//!
//! As an example, the following code defines a killer cage of two cells with a
//! total of 3 on a 4x4 grid. The only combination is `{1,2}`, so afterwards
//! both cells are restricted to these digits.
//!
//! ```
//! use sudoku_regions::Grid;
//! use sudoku_regions::util::DigitSet;
//!
//! let mut grid = Grid::new(2, 2).unwrap();
//! grid.define_standard_regions().unwrap();
//! grid.define_killer_cage(&[(0, 0), (0, 1)], 3).unwrap();
//!
//! let expected: DigitSet = vec![1, 2].into_iter().collect();
//! assert_eq!(expected, grid.options_get(0, 0).unwrap());
//! ```
//!
//! The [ghost] module contains the [GhostCagesManager], which derives
//! "innie" and "outie" cages from the difference between a house and the
//! killer cages it contains or intersects.

pub mod ghost;
pub mod killer;

pub use ghost::{GhostCage, GhostCagesManager, GhostKind};
pub use killer::KillerConstraint;

use crate::util::DigitSet;

/// A closed set of the variant rules that can be attached to a region. The
/// region dispatches on the variant to keep its digit sets in sync with the
/// constraint.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum VariantConstraint {

    /// The digits of the region must add up to the total of the wrapped
    /// [KillerConstraint].
    Killer(KillerConstraint)
}

impl VariantConstraint {

    /// Creates a killer constraint for a cage of `size` cells that must add up
    /// to `total`, where digits range from 1 to `max_digit`.
    ///
    /// # Errors
    ///
    /// `SudokuError::InvalidCageTotal` if no combination of `size` distinct
    /// digits reaches the total.
    pub fn killer(total: usize, size: usize, max_digit: usize)
            -> crate::SudokuResult<VariantConstraint> {
        KillerConstraint::new(total, size, max_digit)
            .map(VariantConstraint::Killer)
    }

    /// Gets the number of cells the constraint was created for.
    pub fn size(&self) -> usize {
        match self {
            VariantConstraint::Killer(k) => k.size()
        }
    }

    /// Gets the digits this constraint still permits in its region.
    pub fn allowed(&self) -> DigitSet {
        match self {
            VariantConstraint::Killer(k) => k.allowed()
        }
    }

    /// Gets the digits this constraint requires in its region.
    pub fn confirmed(&self) -> DigitSet {
        match self {
            VariantConstraint::Killer(k) => k.confirmed()
        }
    }

    /// Indicates whether the constraint can no longer be satisfied.
    pub fn is_broken(&self) -> bool {
        match self {
            VariantConstraint::Killer(k) => k.is_broken()
        }
    }

    /// Brings the constraint in line with the digits its region allows and
    /// confirms. Returns `true` if the constraint changed.
    pub fn restrict(&mut self, allowed: DigitSet, confirmed: DigitSet)
            -> bool {
        match self {
            VariantConstraint::Killer(k) => k.restrict(allowed, confirmed)
        }
    }

    /// Derives the constraint that holds for the remaining cells of the
    /// region once a part of it has been found to contain exactly `digits`.
    pub fn split_off(&self, digits: DigitSet) -> VariantConstraint {
        match self {
            VariantConstraint::Killer(k) =>
                VariantConstraint::Killer(k.split_off(digits))
        }
    }

    /// Gets the wrapped [KillerConstraint], if this is a killer constraint.
    pub fn as_killer(&self) -> Option<&KillerConstraint> {
        match self {
            VariantConstraint::Killer(k) => Some(k)
        }
    }

    /// Gets the wrapped [KillerConstraint] mutably, if this is a killer
    /// constraint.
    pub fn as_killer_mut(&mut self) -> Option<&mut KillerConstraint> {
        match self {
            VariantConstraint::Killer(k) => Some(k)
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn killer_variant_dispatches() {
        let mut constraint = VariantConstraint::killer(7, 2, 4).unwrap();
        let expected: DigitSet = vec![3, 4].into_iter().collect();

        assert_eq!(2, constraint.size());
        assert_eq!(expected, constraint.allowed());
        assert_eq!(expected, constraint.confirmed());
        assert!(constraint.as_killer().is_some());

        assert!(constraint.restrict(DigitSet::range(3), DigitSet::new()));
        assert!(constraint.is_broken());
    }

    #[test]
    fn split_off_keeps_the_variant() {
        let constraint = VariantConstraint::killer(6, 2, 4).unwrap();
        let rest = constraint.split_off(DigitSet::singleton(2));
        let killer = rest.as_killer().unwrap();

        assert_eq!(4, killer.total());
        assert_eq!(vec![DigitSet::singleton(4)], killer.combinations());
    }
}
