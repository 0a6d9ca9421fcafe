//! This module contains the [RegionUpdatesManager], which records for every
//! region and every region-based technique which cells and digits changed
//! since the technique last looked at the region.

use crate::region::Region;
use crate::technique::TechniqueKind;
use crate::util::DigitSet;

const TRACKED: usize = 4;

fn slot(technique: TechniqueKind) -> Option<usize> {
    match technique {
        TechniqueKind::LockedCandidates => Some(0),
        TechniqueKind::NakedSubset => Some(1),
        TechniqueKind::HiddenSubset => Some(2),
        TechniqueKind::Fish => Some(3),
        _ => None
    }
}

fn position_mask(region: &Region) -> u64 {
    let len = region.cells.len();

    if len >= 64 {
        u64::MAX
    }
    else {
        (1u64 << len) - 1
    }
}

/// The cells (as a mask of positions within the region) and digits of a
/// region which are "hot", i.e. changed since a technique last visited it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HotSet {

    /// A bit mask over the positions of the region's cells.
    pub cells: u64,

    /// The digits whose hosts or status changed.
    pub values: DigitSet
}

impl HotSet {

    /// Indicates whether neither cells nor digits are hot.
    pub fn is_empty(&self) -> bool {
        self.cells == 0 && self.values.is_empty()
    }
}

/// Keeps one [HotSet] per region for each of the techniques that work
/// region by region (locked candidates, naked and hidden subsets, fish).
#[derive(Clone, Debug, Default)]
pub struct RegionUpdatesManager {
    hot: Vec<[HotSet; TRACKED]>
}

impl RegionUpdatesManager {

    /// Creates a new manager without any tracked regions.
    pub fn new() -> RegionUpdatesManager {
        RegionUpdatesManager::default()
    }

    fn entry(&mut self, id: usize) -> &mut [HotSet; TRACKED] {
        if self.hot.len() <= id {
            self.hot.resize(id + 1, [HotSet::default(); TRACKED]);
        }

        &mut self.hot[id]
    }

    /// Marks every cell and allowed digit of a newly created region as hot.
    pub fn region_created(&mut self, region: &Region) {
        let full = HotSet {
            cells: position_mask(region),
            values: region.allowed
        };
        *self.entry(region.id) = [full; TRACKED];
    }

    /// Records that `digits` were removed from the cell at `position` of the
    /// given region.
    pub fn cell_changed(&mut self, region: usize, position: usize,
            digits: DigitSet) {
        for hot in self.entry(region).iter_mut() {
            hot.cells |= 1u64 << (position & 63);
            hot.values |= digits;
        }
    }

    /// Records that the status (confirmed or allowed) of `digit` changed in
    /// the given region.
    pub fn value_changed(&mut self, region: usize, digit: usize) {
        for hot in self.entry(region).iter_mut() {
            hot.values.insert(digit);
        }
    }

    /// Passes the hot cells and digits of `parent` on to `child` after a
    /// split, restricted to the child's cells and allowed digits.
    pub fn split(&mut self, parent: &Region, child: &Region) {
        let parent_hot = *self.entry(parent.id);
        let child_hot = self.entry(child.id);

        for (p, c) in parent_hot.iter().zip(child_hot.iter_mut()) {
            for (position, &cell) in parent.cells.iter().enumerate() {
                if p.cells & (1u64 << (position & 63)) != 0 {
                    if let Some(child_pos) = child.position(cell) {
                        c.cells |= 1u64 << (child_pos & 63);
                    }
                }
            }

            c.values |= p.values & child.allowed;
        }
    }

    /// Indicates whether anything in the given region is hot for the given
    /// technique.
    pub fn is_hot(&self, region: usize, technique: TechniqueKind) -> bool {
        self.hot(region, technique).map(|h| !h.is_empty()).unwrap_or(false)
    }

    /// Gets the hot set of the given region for the given technique.
    pub fn hot(&self, region: usize, technique: TechniqueKind)
            -> Option<HotSet> {
        let slot = slot(technique)?;
        self.hot.get(region).map(|h| h[slot])
    }

    /// Clears the hot set of the given region for the given technique and
    /// returns its previous content.
    pub fn take(&mut self, region: usize, technique: TechniqueKind)
            -> HotSet {
        match slot(technique) {
            Some(slot) => {
                let hot = &mut self.entry(region)[slot];
                let result = *hot;
                *hot = HotSet::default();
                result
            },
            None => HotSet::default()
        }
    }

    /// Clears only the given digit from the hot set of the given region for
    /// the given technique.
    pub fn clear_value(&mut self, region: usize, technique: TechniqueKind,
            digit: usize) {
        if let Some(slot) = slot(technique) {
            self.entry(region)[slot].values.remove(digit);
        }
    }

    /// Marks everything in all given regions as hot, and forgets regions
    /// beyond them. Used after rolling back the journal.
    pub fn reset<'a, I>(&mut self, regions: I, count: usize)
    where
        I: Iterator<Item = &'a Region>
    {
        self.hot.truncate(count);

        for region in regions {
            self.region_created(region);
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    use crate::region::RegionKind;

    fn region(id: usize, cells: Vec<usize>, allowed: DigitSet) -> Region {
        let mut region = Region::new(id, RegionKind::Derived, cells, 16,
            allowed, DigitSet::new());
        region.id = id;
        region
    }

    #[test]
    fn created_region_is_hot() {
        let mut updates = RegionUpdatesManager::new();
        let row = region(0, vec![0, 1, 2, 3], DigitSet::range(4));
        updates.region_created(&row);

        let hot = updates.hot(0, TechniqueKind::NakedSubset).unwrap();
        assert_eq!(0b1111, hot.cells);
        assert_eq!(DigitSet::range(4), hot.values);
        assert!(!updates.is_hot(0, TechniqueKind::Bifurcation));
    }

    #[test]
    fn take_clears_only_one_technique() {
        let mut updates = RegionUpdatesManager::new();
        updates.cell_changed(2, 1, DigitSet::singleton(3));

        let hot = updates.take(2, TechniqueKind::HiddenSubset);
        assert_eq!(0b10, hot.cells);
        assert_eq!(DigitSet::singleton(3), hot.values);
        assert!(!updates.is_hot(2, TechniqueKind::HiddenSubset));
        assert!(updates.is_hot(2, TechniqueKind::Fish));

        updates.clear_value(2, TechniqueKind::Fish, 3);
        let hot = updates.hot(2, TechniqueKind::Fish).unwrap();
        assert!(hot.values.is_empty());
        assert_eq!(0b10, hot.cells);
    }

    #[test]
    fn split_redistributes_hot_cells() {
        let mut updates = RegionUpdatesManager::new();
        let parent = region(0, vec![0, 1, 2, 3], DigitSet::range(4));
        let child = region(1, vec![2, 3],
            vec![3, 4].into_iter().collect());
        updates.cell_changed(0, 3, DigitSet::range(2));
        updates.cell_changed(0, 0, DigitSet::singleton(4));
        updates.split(&parent, &child);

        let hot = updates.hot(1, TechniqueKind::LockedCandidates).unwrap();
        assert_eq!(0b10, hot.cells);
        assert_eq!(DigitSet::singleton(4), hot.values);
    }
}
