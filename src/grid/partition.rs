//! The operations on the partition tree of regions. They are methods of the
//! [Grid], since changing the digits of a region cascades into its cells.

use crate::constraint::{GhostCage, KillerConstraint, VariantConstraint};
use crate::constraint::ghost;
use crate::grid::Grid;
use crate::progress::Progress;
use crate::region::{Children, Region, RegionId, RegionKind};
use crate::util::{CellSet, DigitSet};

use log::trace;

/// Sum-only ghost cages with more cells than this are not registered, since
/// pruning them requires an exhaustive search over their cells.
pub(crate) const MAX_SUM_CAGE_CELLS: usize = 6;

impl Grid {

    /// Records the region for the journal and returns it mutably.
    fn region_mut(&mut self, id: RegionId) -> &mut Region {
        self.journal.record_region(self.regions.get(id));
        self.changes += 1;
        self.regions.get_mut(id)
    }

    fn push_region(&mut self, region: Region) -> RegionId {
        self.journal.record_region_added(self.regions.len());
        let id = self.regions.push(region);
        self.updates.region_created(self.regions.get(id));
        self.pending.insert(id);
        self.changes += 1;
        id
    }

    /// Adds a starting region (defined by the puzzle or a ghost cage). Cells
    /// lose all options the region does not allow, solved cells are split
    /// off, and a congruent leaf is merged with the new region.
    pub(crate) fn add_starting_region(&mut self, cells: Vec<usize>,
            kind: RegionKind, constraint: Option<VariantConstraint>)
            -> RegionId {
        let size = self.size;
        let is_house = cells.len() == size;
        let mut allowed = DigitSet::range(size);
        let mut confirmed = if is_house {
            DigitSet::range(size)
        }
        else {
            DigitSet::new()
        };

        if let Some(constraint) = &constraint {
            allowed &= constraint.allowed();
            confirmed |= constraint.confirmed();
        }

        let mut region = Region::new(0, kind, cells, self.cell_count(),
            allowed, confirmed);
        region.constraint = constraint;
        region.closed = is_house;
        let id = self.push_region(region);
        self.journal.record_starting_added();
        self.regions.add_starting(id);

        if kind == RegionKind::KillerCage {
            self.journal.record_ghosts(&self.ghosts);
            self.ghosts.rescan_houses();
        }

        let cell_set = self.regions.get(id).cell_set().clone();
        let congruent = self.regions.leaves_of_cell(
                self.regions.get(id).cells()[0])
            .iter()
            .cloned()
            .find(|&leaf| leaf != id &&
                self.regions.get(leaf).cell_set() == &cell_set);

        if let Some(existing) = congruent {
            self.merge_regions(existing, id);
        }

        let cells = self.regions.get(id).cells().to_vec();

        for &cell in cells.iter() {
            self.eliminate(cell, DigitSet::range(size) - allowed);
        }

        for &cell in cells.iter() {
            let value = self.cells[cell].value();

            if value != 0 {
                self.register_closed_subset(&[cell],
                    DigitSet::singleton(value));
            }
        }

        id
    }

    /// Merges `other` into `region`, which must consist of the same cells.
    /// `other` becomes the only (right) child of `region`, takes over its
    /// digit restrictions and, if it has none of its own, its constraint.
    pub(crate) fn merge_regions(&mut self, region: RegionId, other: RegionId) {
        if region == other || !self.regions.is_leaf(region) {
            return;
        }

        let parent = self.regions.get(region).clone();

        if parent.cell_set() != self.regions.get(other).cell_set() {
            self.fail(Progress::InconsistentPartition { region });
            return;
        }

        self.region_mut(region).children = Some(Children {
            left: None,
            right: other
        });
        self.regions.retire_leaf(region);

        let child = self.region_mut(other);
        child.parents.push(region);

        if child.constraint.is_none() {
            child.constraint = parent.constraint.clone();
        }

        let child = self.regions.get(other).clone();
        self.updates.split(&parent, &child);
        self.restrict_region(other, parent.allowed(), parent.confirmed());
        self.pending.insert(other);
        self.settle();
    }

    /// Restricts a region to the given allowed digits and confirms the given
    /// digits in it, with the usual fatal checks.
    fn restrict_region(&mut self, id: RegionId, allowed: DigitSet,
            confirmed: DigitSet) {
        let region = self.regions.get(id);
        let to_remove = region.allowed() - allowed;
        let to_confirm = confirmed - region.confirmed();

        for digit in to_remove.iter() {
            self.remove_allowed_value(id, digit);
        }

        for digit in to_confirm.iter() {
            self.add_confirmed_value(id, digit);
        }
    }

    /// Confirms `digit` in a region, i.e. records that it must appear in one
    /// of the region's cells. If the region does not allow the digit, a
    /// fatal [Progress::NoCellLeftForValueInRegion] is queued instead.
    pub(crate) fn add_confirmed_value(&mut self, id: RegionId, digit: usize) {
        let region = self.regions.get(id);

        if region.confirmed().contains(digit) {
            return;
        }

        if !region.allowed().contains(digit) {
            self.fail(Progress::NoCellLeftForValueInRegion {
                region: id,
                value: digit
            });
            return;
        }

        let region = self.region_mut(id);
        region.confirmed.insert(digit);

        if let Some(killer) = region.constraint.as_mut()
                .and_then(VariantConstraint::as_killer_mut) {
            killer.require(digit);
        }

        self.updates.value_changed(id, digit);
        self.pending.insert(id);
        self.settle();
    }

    /// Removes `digit` from the digits a region allows and eliminates it
    /// from the region's cells. If the region has confirmed the digit, a
    /// fatal [Progress::NoCellLeftForValueInRegion] is queued instead.
    pub(crate) fn remove_allowed_value(&mut self, id: RegionId, digit: usize) {
        let region = self.regions.get(id);

        if !region.allowed().contains(digit) {
            return;
        }

        if region.confirmed().contains(digit) {
            self.fail(Progress::NoCellLeftForValueInRegion {
                region: id,
                value: digit
            });
            return;
        }

        let region = self.region_mut(id);
        region.allowed.remove(digit);

        if let Some(killer) = region.constraint.as_mut()
                .and_then(VariantConstraint::as_killer_mut) {
            killer.disallow(digit);
        }

        let cells = region.cells.clone();
        self.updates.value_changed(id, digit);
        self.pending.insert(id);

        for cell in cells {
            self.eliminate(cell, DigitSet::singleton(digit));
        }

        self.settle();
    }

    /// Registers that the given cells contain exactly the given digits (they
    /// form a closed subset). Every leaf consisting of exactly these cells
    /// takes over the digits, and every larger leaf containing them is split
    /// with the subset as its left child.
    pub(crate) fn register_closed_subset(&mut self, cells: &[usize],
            values: DigitSet) {
        if cells.is_empty() {
            return;
        }

        let cell_set = CellSet::from_cells(self.cell_count(),
            cells.iter().cloned());
        let leaves = self.regions.leaves_containing_all(cells);

        for leaf in leaves {
            if !self.regions.is_leaf(leaf) || self.queue.has_high_priority() {
                continue;
            }

            if self.regions.get(leaf).cell_set() == &cell_set {
                self.restrict_region(leaf, values, values);
            }
            else {
                self.partition_region(leaf, cells, values);
            }
        }

        self.settle();
    }

    /// Splits a leaf region into a left child consisting of `left_cells`,
    /// which contain exactly `left_values`, and a right child consisting of
    /// the remaining cells. Congruent leaves are reused as children instead
    /// of creating new regions. The digits of the left child are eliminated
    /// from the right child's cells, confirmed digits are passed on to the
    /// child allowing them, and a killer constraint is split accordingly.
    ///
    /// Returns the children, or `None` if the region was not split. If
    /// `left_cells` is not a proper, non-empty subset of the region's cells,
    /// a fatal [Progress::InconsistentPartition] is queued.
    pub(crate) fn partition_region(&mut self, id: RegionId,
            left_cells: &[usize], left_values: DigitSet) -> Option<Children> {
        if !self.regions.is_leaf(id) {
            return None;
        }

        let parent = self.regions.get(id).clone();
        let cell_count = self.cell_count();
        let left_set = CellSet::from_cells(cell_count,
            left_cells.iter().cloned());

        if left_set.is_empty() || !left_set.is_subset(parent.cell_set()) ||
                &left_set == parent.cell_set() {
            self.fail(Progress::InconsistentPartition { region: id });
            return None;
        }

        if let Some(digit) = (left_values - parent.allowed()).min() {
            self.fail(Progress::NoCellLeftForValueInRegion {
                region: id,
                value: digit
            });
            return None;
        }

        trace!(target: "deduction", "splitting region {} along {:?} with {}",
            id, left_cells, left_values);

        let right_set = parent.cell_set().difference(&left_set);
        let right_cells: Vec<usize> = right_set.iter().collect();

        for &cell in right_cells.iter() {
            self.eliminate(cell, left_values);
        }

        let right_allowed = parent.allowed() - left_values;
        let right_confirmed = parent.confirmed() - left_values;
        let right_constraint = parent.constraint()
            .map(|c| c.split_off(left_values));

        let left = match self.regions.find_leaf(&left_set) {
            Some(existing) => existing,
            None => {
                let mut region = Region::new(0, RegionKind::Derived,
                    left_cells.to_vec(), cell_count, left_values,
                    left_values);
                region.closed = true;
                self.push_region(region)
            }
        };

        let right = match self.regions.find_leaf(&right_set) {
            Some(existing) => {
                if let Some(constraint) = right_constraint {
                    let region = self.region_mut(existing);

                    if region.constraint.is_none() {
                        region.constraint = Some(constraint);
                    }
                }

                existing
            },
            None => {
                let mut region = Region::new(0, RegionKind::Derived,
                    right_cells, cell_count, right_allowed, right_confirmed);
                region.constraint = right_constraint;
                self.push_region(region)
            }
        };

        self.region_mut(id).children = Some(Children {
            left: Some(left),
            right
        });
        self.regions.retire_leaf(id);

        for &child in [left, right].iter() {
            self.region_mut(child).parents.push(id);
            let child_region = self.regions.get(child).clone();
            self.updates.split(&parent, &child_region);
            self.pending.insert(child);
        }

        self.restrict_region(left, left_values, left_values);
        self.restrict_region(right, right_allowed, right_confirmed);
        self.settle();

        Some(Children {
            left: Some(left),
            right
        })
    }

    /// Brings a leaf region in line with its cells and its constraint:
    /// removes allowed digits without hosts, syncs the killer constraint,
    /// promotes allowed digits to confirmed (or the reverse) once their count
    /// matches the number of cells, and queues hidden singles and fatal
    /// deductions.
    pub(crate) fn refresh_region(&mut self, id: RegionId) {
        loop {
            if self.queue.has_high_priority() {
                return;
            }

            let region = self.regions.get(id);
            let len = region.len();
            let allowed = region.allowed();
            let confirmed = region.confirmed();
            let union = region.options_union(&self.cells);
            let stray: Vec<(usize, DigitSet)> = region.cells().iter()
                .map(|&c| (c, self.cells[c].options() - allowed))
                .filter(|(_, d)| !d.is_empty())
                .collect();
            let has_constraint = region.constraint.is_some();

            if !stray.is_empty() {
                for (cell, digits) in stray {
                    self.eliminate(cell, digits);
                }

                continue;
            }

            let unhosted = allowed - union;

            if let Some(digit) = (unhosted & confirmed).min() {
                self.fail(Progress::NoCellLeftForValueInRegion {
                    region: id,
                    value: digit
                });
                return;
            }

            if !unhosted.is_empty() {
                for digit in unhosted.iter() {
                    self.remove_allowed_value(id, digit);
                }

                continue;
            }

            if has_constraint {
                let mut constraint = match self.regions.get(id).constraint() {
                    Some(constraint) => constraint.clone(),
                    None => return
                };

                let changed = constraint.restrict(allowed, confirmed);
                let broken = constraint.is_broken();
                let new_allowed = constraint.allowed();
                let new_confirmed = constraint.confirmed();

                if changed {
                    self.region_mut(id).constraint = Some(constraint);
                }

                if broken {
                    self.fail(Progress::NoValidKillerSum { region: id });
                    return;
                }

                if new_allowed != allowed ||
                        !new_confirmed.is_subset(confirmed) {
                    self.restrict_region(id, new_allowed,
                        new_confirmed | confirmed);
                    continue;
                }
            }

            if confirmed.len() > len {
                self.fail(Progress::TooManyValuesForRegion { region: id });
                return;
            }

            if allowed.len() < len {
                self.fail(Progress::TooFewValuesForRegion { region: id });
                return;
            }

            if allowed.len() == len && confirmed != allowed {
                self.restrict_region(id, allowed, allowed);
                continue;
            }

            if confirmed.len() == len && confirmed != allowed {
                self.restrict_region(id, confirmed, confirmed);
                continue;
            }

            let region = self.regions.get(id);

            if region.is_closed() && !region.closed {
                self.region_mut(id).closed = true;
                self.queue.push(Progress::RegionBecameClosed { region: id });
            }

            let region = self.regions.get(id);
            let mut singles = Vec::new();

            for digit in confirmed.iter() {
                let hosts = region.hosts(&self.cells, digit);

                if let [cell] = hosts[..] {
                    if !self.cells[cell].is_solved() {
                        singles.push(Progress::HiddenSingle {
                            region: id,
                            cell,
                            value: digit
                        });
                    }
                }
            }

            for single in singles {
                self.queue.push(single);
            }

            return;
        }
    }

    /// Restricts the cells of a killer region to the digits used by some
    /// placement of its remaining combinations, and drops combinations that
    /// cannot be placed at all.
    pub(crate) fn check_cage(&mut self, id: RegionId) {
        if !self.regions.is_leaf(id) {
            return;
        }

        let region = self.regions.get(id);
        let cells = region.cells().to_vec();
        let options: Vec<DigitSet> =
            cells.iter().map(|&c| self.cells[c].options()).collect();

        let mut killer = match region.constraint()
                .and_then(VariantConstraint::as_killer) {
            Some(killer) => killer.clone(),
            None => return
        };

        let (placements, removed) = killer.find_placements(&options);

        if removed {
            let broken = killer.is_broken();
            self.region_mut(id).constraint =
                Some(VariantConstraint::Killer(killer));

            if broken {
                self.fail(Progress::NoValidKillerSum { region: id });
                return;
            }

            self.pending.insert(id);
        }

        for ((&cell, &old), &new) in
                cells.iter().zip(options.iter()).zip(placements.iter()) {
            let removed = old - new;

            if !removed.is_empty() {
                trace!(target: "deduction",
                    "killer region {} rules out {} in cell #{}", id, removed,
                    cell);
                self.eliminate(cell, removed);
            }
        }

        self.settle();
    }

    /// Registers a derived innie or outie. Ghost cages whose cells all see
    /// each other become starting regions of kind [RegionKind::Ghost] with a
    /// killer constraint; other small ghost cages are kept as sum-only cages.
    /// Broken ghost cages queue a fatal [Progress::BrokenGhostCage].
    pub(crate) fn register_ghost(&mut self, cage: GhostCage) {
        if cage.cells.is_empty() || self.ghosts.is_known(&cage.cells) {
            if cage.is_broken(self.size) {
                self.fail(broken_ghost(&cage));
            }

            return;
        }

        if cage.is_broken(self.size) {
            self.fail(broken_ghost(&cage));
            return;
        }

        let pairwise = cage.cells.iter().enumerate().all(|(i, &a)|
            cage.cells[i + 1..].iter().all(|&b| self.regions.sees(a, b)));

        if pairwise && cage.cells.len() <= self.size {
            let total = cage.total as usize;

            match KillerConstraint::new(total, cage.cells.len(), self.size) {
                Ok(killer) => {
                    self.journal.record_ghosts(&self.ghosts);
                    self.ghosts.register_region(&cage.cells);
                    self.add_starting_region(cage.cells.clone(),
                        RegionKind::Ghost,
                        Some(VariantConstraint::Killer(killer)));
                },
                Err(_) => self.fail(broken_ghost(&cage))
            }
        }
        else if cage.cells.len() <= MAX_SUM_CAGE_CELLS {
            self.journal.record_ghosts(&self.ghosts);
            let cell_count = self.cell_count();
            self.ghosts.register_sum_cage(cage.cells.clone(), cage.total,
                cage.kind, cell_count);
        }

        self.settle();
    }

    /// Computes the options of the cells of the sum-only ghost cage with the
    /// given index that are not used by any assignment reaching its total.
    /// Returns the deductions to be queued.
    pub(crate) fn prune_sum_cage(&self, index: usize) -> Vec<Progress> {
        let cage = match self.ghosts.sum_cages().get(index) {
            Some(cage) => cage,
            None => return Vec::new()
        };
        let options: Vec<DigitSet> = cage.cells.iter()
            .map(|&c| self.cells[c].options())
            .collect();
        let sees: Vec<Vec<bool>> = cage.cells.iter()
            .map(|&a| cage.cells.iter()
                .map(|&b| a != b && self.regions.sees(a, b))
                .collect())
            .collect();

        match ghost::sum_placements(&options, &sees, cage.total) {
            Some(placements) => cage.cells.iter()
                .zip(options.iter().zip(placements.iter()))
                .filter(|(_, (&old, &new))| old != new)
                .map(|(&cell, (&old, &new))| Progress::GhostCageElimination {
                    cell,
                    values: old - new
                })
                .collect(),
            None => vec![Progress::BrokenGhostCage {
                cells: cage.cells.clone(),
                total: cage.total,
                kind: cage.kind
            }]
        }
    }
}

fn broken_ghost(cage: &GhostCage) -> Progress {
    Progress::BrokenGhostCage {
        cells: cage.cells.clone(),
        total: cage.total,
        kind: cage.kind
    }
}
