//! This module contains the [FishTechnique].

use crate::grid::Grid;
use crate::progress::{FishKind, Progress};
use crate::region::RegionId;
use crate::technique::{needs_work, SolvingTechnique, TechniqueKind};
use crate::util::CellSet;

use log::trace;

struct Base {
    id: RegionId,
    cells: CellSet,
    hosts: Vec<usize>
}

impl Base {
    fn new(grid: &Grid, id: RegionId, digit: usize) -> Base {
        let region = grid.regions().get(id);

        Base {
            id,
            cells: region.cell_set().clone(),
            hosts: region.hosts(grid.cells(), digit)
        }
    }
}

struct Fish {
    cover: Vec<RegionId>,
    fins: Vec<usize>
}

enum CoverResult {
    Nothing,
    Found(Progress),
    Invalid
}

struct CoverSearch<'a> {
    grid: &'a Grid,
    digit: usize,
    size: usize,
    max_fins: usize,
    bases: &'a [&'a Base],
    candidates: Vec<usize>
}

impl<'a> CoverSearch<'a> {

    fn is_base(&self, id: RegionId) -> bool {
        self.bases.iter().any(|b| b.id == id)
    }

    fn eliminations(&self, fish: &Fish) -> (Vec<usize>, FishKind) {
        let grid = self.grid;
        let mut covered = CellSet::new(grid.cell_count());
        let mut cover_count = vec![0usize; grid.cell_count()];

        for &id in fish.cover.iter() {
            let cells = grid.regions().get(id).cell_set();
            covered.union_assign(cells);

            for cell in cells.iter() {
                cover_count[cell] += 1;
            }
        }

        let fin_seen = if fish.fins.is_empty() {
            None
        }
        else {
            Some(grid.regions().cells_seeing_all(fish.fins.iter().cloned()))
        };
        let mut targets = Vec::new();
        let mut cannibal = false;

        // Every covered cell is checked, even after a cell seeing all fins
        // was found.
        for cell in covered.iter() {
            if !grid.cells()[cell].options().contains(self.digit) {
                continue;
            }

            let is_candidate = self.candidates.binary_search(&cell).is_ok();
            let eliminate = if is_candidate {
                cover_count[cell] >= 2
            }
            else {
                true
            };

            let sees_fins = match &fin_seen {
                Some(seen) => seen.contains(cell),
                None => true
            };

            if eliminate && sees_fins {
                if is_candidate {
                    cannibal = true;
                }

                targets.push(cell);
            }
        }

        let kind = if !fish.fins.is_empty() {
            FishKind::Finned
        }
        else if cannibal {
            FishKind::Cannibal
        }
        else {
            FishKind::Plain
        };

        (targets, kind)
    }

    fn search(&self, fish: &mut Fish, covered: &CellSet) -> CoverResult {
        let uncovered = self.candidates.iter()
            .cloned()
            .find(|&c| !covered.contains(c) && !fish.fins.contains(&c));

        let cell = match uncovered {
            Some(cell) => cell,
            None => {
                if fish.cover.len() < self.size && fish.fins.is_empty() {
                    return CoverResult::Invalid;
                }

                let (eliminations, kind) = self.eliminations(fish);

                if eliminations.is_empty() {
                    return CoverResult::Nothing;
                }

                return CoverResult::Found(Progress::Fish {
                    value: self.digit,
                    size: self.size,
                    kind,
                    base: self.bases.iter().map(|b| b.id).collect(),
                    cover: fish.cover.clone(),
                    eliminations
                });
            }
        };

        if fish.cover.len() < self.size {
            let mut options: Vec<(usize, RegionId)> = self.grid.regions()
                .leaves_of_cell(cell)
                .iter()
                .cloned()
                .filter(|&id| !self.is_base(id) && !fish.cover.contains(&id))
                .map(|id| {
                    let cells = self.grid.regions().get(id).cell_set();
                    let gain = self.candidates.iter()
                        .filter(|&&c| cells.contains(c) && !covered.contains(c))
                        .count();
                    (gain, id)
                })
                .collect();
            options.sort_by(|a, b| b.0.cmp(&a.0));

            for (_, id) in options {
                let mut new_covered = covered.clone();
                new_covered.union_assign(self.grid.regions().get(id)
                    .cell_set());
                fish.cover.push(id);

                match self.search(fish, &new_covered) {
                    CoverResult::Nothing => { },
                    result => return result
                }

                fish.cover.pop();
            }
        }

        if fish.fins.len() < self.max_fins {
            fish.fins.push(cell);

            match self.search(fish, covered) {
                CoverResult::Nothing => { },
                result => return result
            }

            fish.fins.pop();
        }

        CoverResult::Nothing
    }
}

/// A [SolvingTechnique] which finds fish, a family of patterns that includes
/// X-Wings, Swordfish, and Jellyfish.
///
/// A fish of size `n` for some digit consists of `n` *base* regions, which
/// share no cells and all must contain the digit, and `n` *cover* regions
/// which together contain every cell of the base regions that can still
/// hold the digit. Since each cover region can contain the digit at most
/// once, the `n` digits of the base regions occupy every cover region, so
/// the digit can be removed from all other cells of the cover regions.
/// Additionally, a candidate cell in two cover regions cannot hold the
/// digit (a *cannibal* fish).
///
/// Candidate cells of the base regions that are not covered are called
/// *fins*. If there are fins, the digit is only removed from cells which see
/// every fin (a *finned* fish). If the candidates of `n` base regions can be
/// covered by fewer than `n` regions without fins, the puzzle has no
/// solution.
///
/// ```text
/// ╔═══╤═══╦═══╤═══╗
/// ║ X │   ║ X │   ║
/// ╟───┼───╫───┼───╢
/// ║ O │   ║ O │   ║
/// ╠═══╪═══╬═══╪═══╣
/// ║ X │   ║ X │   ║
/// ╟───┼───╫───┼───╢
/// ║ O │   ║ O │   ║
/// ╚═══╧═══╩═══╧═══╝
/// ```
///
/// In the example above, the cells marked with X are the only ones in their
/// rows which can contain some digit. The rows are the base regions and the
/// columns the cover regions, so the digit can be removed from the cells
/// marked with O.
///
/// This technique works digit by digit. It is not used inside bifurcation
/// branches.
#[derive(Clone, Debug)]
pub struct FishTechnique {
    max_size: usize,
    max_fins: usize,
    next_digit: usize,
    finished: bool
}

impl FishTechnique {

    /// Creates a new fish technique for fish with at most `max_size` base
    /// regions and at most `max_fins` fins.
    pub fn new(max_size: usize, max_fins: usize) -> FishTechnique {
        FishTechnique {
            max_size,
            max_fins,
            next_digit: 1,
            finished: false
        }
    }

    fn is_hot(grid: &Grid, digit: usize) -> bool {
        grid.regions().leaves().any(|id|
            grid.updates.hot(id, TechniqueKind::Fish)
                .map(|h| h.values.contains(digit))
                .unwrap_or(false))
    }

    fn choose_bases<'a>(&self, grid: &Grid, digit: usize, size: usize,
            candidates: &'a [Base], start: usize, chosen: &mut Vec<&'a Base>)
            -> CoverResult {
        if chosen.len() == size {
            let mut hosts: Vec<usize> = chosen.iter()
                .flat_map(|b| b.hosts.iter().cloned())
                .collect();
            hosts.sort_unstable();
            let search = CoverSearch {
                grid,
                digit,
                size,
                max_fins: self.max_fins,
                bases: chosen,
                candidates: hosts
            };
            let mut fish = Fish {
                cover: Vec::new(),
                fins: Vec::new()
            };

            return search.search(&mut fish, &CellSet::new(grid.cell_count()));
        }

        for index in start..candidates.len() {
            let base = &candidates[index];

            if chosen.iter().any(|b| !b.cells.is_disjoint(&base.cells)) {
                continue;
            }

            chosen.push(base);

            match self.choose_bases(grid, digit, size, candidates, index + 1,
                    chosen) {
                CoverResult::Nothing => { },
                result => return result
            }

            chosen.pop();
        }

        CoverResult::Nothing
    }

    fn examine(&self, grid: &mut Grid, digit: usize) -> bool {
        let candidates: Vec<Base> = grid.regions().leaves()
            .filter(|&id| {
                let region = grid.regions().get(id);
                region.confirmed().contains(digit) && needs_work(grid, region)
            })
            .map(|id| Base::new(grid, id, digit))
            .filter(|b| b.hosts.len() >= 2)
            .collect();
        let max_size = self.max_size.min(candidates.len());

        for size in 2..=max_size {
            match self.choose_bases(grid, digit, size, &candidates, 0,
                    &mut Vec::new()) {
                CoverResult::Found(progress) => {
                    trace!(target: "technique", "{}", progress);
                    grid.queue.push(progress);
                    return true;
                },
                CoverResult::Invalid => {
                    grid.queue.push(Progress::InvalidFish {
                        value: digit,
                        size
                    });
                    return true;
                },
                CoverResult::Nothing => { }
            }
        }

        let leaves: Vec<RegionId> = grid.regions().leaves().collect();

        for id in leaves {
            grid.updates.clear_value(id, TechniqueKind::Fish, digit);
        }

        false
    }
}

impl SolvingTechnique for FishTechnique {

    fn kind(&self) -> TechniqueKind {
        TechniqueKind::Fish
    }

    fn next_step(&mut self, grid: &mut Grid) -> bool {
        while self.next_digit <= grid.size() {
            let digit = self.next_digit;
            self.next_digit += 1;

            if FishTechnique::is_hot(grid, digit) {
                return self.examine(grid, digit);
            }
        }

        self.finished = true;
        false
    }

    fn reset(&mut self) {
        self.next_digit = 1;
        self.finished = false;
    }

    fn has_finished(&self) -> bool {
        self.finished
    }
}
