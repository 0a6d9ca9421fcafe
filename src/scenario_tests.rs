use crate::{Grid, Progress, SolverConfig, SudokuError};
use crate::exact_cover::{BruteForceSolver, SolutionCount};
use crate::solver::{GridProgressManager, SolveStatus};
use crate::util::DigitSet;

use std::sync::{Arc, Mutex, Once};

static LOGGING: Once = Once::new();

fn init_logging() {
    LOGGING.call_once(|| env_logger::builder().is_test(true).init());
}

fn parse(code: &str) -> Vec<usize> {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(10).map(|d| d as usize).unwrap_or(0))
        .collect()
}

fn grid_with_givens(block_width: usize, block_height: usize, code: &str)
        -> Grid {
    let mut grid = Grid::new(block_width, block_height).unwrap();
    grid.define_standard_regions().unwrap();
    let size = grid.size();

    for (cell, value) in parse(code).into_iter().enumerate() {
        grid.add_given_cell(cell / size, cell % size, value).unwrap();
    }

    grid
}

fn seeded(depth: usize) -> SolverConfig {
    SolverConfig {
        max_bifurcation_depth: depth,
        rng_seed: Some(42),
        ..SolverConfig::default()
    }
}

fn assert_options_contain(grid: &Grid, solution: &[usize]) {
    for (cell, &digit) in solution.iter().enumerate() {
        assert!(grid.cells()[cell].options().contains(digit),
            "cell #{} lost {}", cell, digit);
    }
}

const CLASSIC_PUZZLE: &str = "
    53..7....
    6..195...
    .98....6.
    8...6...3
    4..8.3..1
    7...2...6
    .6....28.
    ...419..5
    ....8..79";

const CLASSIC_SOLUTION: &str = "
    534678912
    672195348
    198342567
    859761423
    426853791
    713924856
    961537284
    287419635
    345286179";

const HARD_PUZZLE: &str =
    "769000028000400009000000005005000000090860070280003000008300091002080600000000200";

const HARD_SOLUTION: &str =
    "769531428521478369834296715175942836493865172286713954648327591352189647917654283";

#[test]
fn classic_puzzle_is_solved_by_logic() {
    init_logging();
    let mut grid = grid_with_givens(3, 3, CLASSIC_PUZZLE);
    let mut manager = GridProgressManager::new(&SolverConfig::logic_only());
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink_messages = Arc::clone(&messages);
    manager.set_sink(Box::new(move |progress| {
        sink_messages.lock().unwrap().push(progress.to_string());
    }));

    assert_eq!(SolveStatus::Solved, manager.run_to_completion(&mut grid));
    assert_eq!(parse(CLASSIC_SOLUTION), grid.values());
    assert_eq!(manager.applied_count(), messages.lock().unwrap().len());
    assert!(grid.queue().is_empty());
}

#[test]
fn classic_puzzle_is_unique() {
    let grid = grid_with_givens(3, 3, CLASSIC_PUZZLE);
    let result = BruteForceSolver::new().generate_solutions(&grid, 2, false);

    assert_eq!(SolutionCount::Unique(parse(CLASSIC_SOLUTION)),
        result.solution_count());
}

#[test]
fn hard_puzzle_is_unique_and_never_broken() {
    init_logging();
    let mut grid = grid_with_givens(3, 3, HARD_PUZZLE);
    let result = BruteForceSolver::new().generate_solutions(&grid, 2, false);
    let solution = parse(HARD_SOLUTION);

    assert_eq!(SolutionCount::Unique(solution.clone()),
        result.solution_count());

    let status = GridProgressManager::new(&seeded(1))
        .run_to_completion(&mut grid);

    assert_ne!(SolveStatus::Unsolvable, status);
    assert_options_contain(&grid, &solution);
}

#[test]
fn three_givens_do_not_contradict() {
    init_logging();

    // ╔═══╤═══╦═══╤═══╗
    // ║ 1 │   ║   │   ║
    // ╟───┼───╫───┼───╢
    // ║   │ 2 ║   │   ║
    // ╠═══╪═══╬═══╪═══╣
    // ║   │   ║ 3 │   ║
    // ╟───┼───╫───┼───╢
    // ║   │   ║   │   ║
    // ╚═══╧═══╩═══╧═══╝
    let mut grid = grid_with_givens(2, 2, "1... .2.. ..3. ....");
    let first = parse("1423 3214 4132 2341");
    let second = parse("1342 4213 2431 3124");
    let status = GridProgressManager::new(&seeded(2))
        .run_to_completion(&mut grid);

    assert_eq!(SolveStatus::Stalled, status);
    assert_options_contain(&grid, &first);
    assert_options_contain(&grid, &second);
    assert_eq!(SolutionCount::Ambiguous,
        BruteForceSolver::new().generate_solutions(&grid, 2, false)
            .solution_count());
}

#[test]
fn killer_cage_with_unreachable_total_is_rejected() {
    let mut grid = Grid::new(2, 2).unwrap();
    grid.define_standard_regions().unwrap();

    assert!(grid.define_killer_cage(&[(0, 0), (0, 1)], 3).is_ok());
    assert_eq!(Err(SudokuError::InvalidCageTotal),
        grid.define_killer_cage(&[(2, 2), (3, 3)], 17));
}

#[test]
fn confirming_disallowed_value_in_cage_is_fatal() {
    let mut grid = Grid::new(3, 3).unwrap();
    grid.define_standard_regions().unwrap();
    let low = grid.define_killer_cage(&[(0, 0), (0, 1)], 3).unwrap();
    grid.define_killer_cage(&[(5, 5), (5, 6)], 17).unwrap();

    let low_options: DigitSet = [1, 2].iter().cloned().collect();
    let high_options: DigitSet = [8, 9].iter().cloned().collect();

    assert_eq!(low_options, grid.options_get(0, 0).unwrap());
    assert_eq!(low_options, grid.options_get(0, 1).unwrap());
    assert_eq!(high_options, grid.options_get(5, 5).unwrap());
    assert_eq!(high_options, grid.options_get(5, 6).unwrap());

    grid.add_confirmed_value(low, 3);

    let fatal = Progress::NoCellLeftForValueInRegion {
        region: low,
        value: 3
    };

    assert!(grid.queue().iter().any(|p| *p == fatal));
    assert!(grid.queue().has_high_priority());

    let status = GridProgressManager::new(&SolverConfig::logic_only())
        .run_to_completion(&mut grid);

    assert_eq!(SolveStatus::Unsolvable, status);
}

#[test]
fn killer_puzzle_is_solved() {
    init_logging();

    // Two cages per pair of rows, each lying in a single box.
    let mut grid = grid_with_givens(2, 2, "1... 3... ..4. ..2.");
    grid.define_killer_cage(&[(0, 0), (0, 1)], 3).unwrap();
    grid.define_killer_cage(&[(1, 0), (1, 1)], 7).unwrap();
    grid.define_killer_cage(&[(2, 2), (2, 3)], 7).unwrap();
    grid.define_killer_cage(&[(3, 2), (3, 3)], 3).unwrap();
    let solution = parse("1234 3412 2143 4321");

    assert_eq!(SolutionCount::Unique(solution.clone()),
        BruteForceSolver::new().generate_solutions(&grid, 2, false)
            .solution_count());

    let status = GridProgressManager::new(&SolverConfig::logic_only())
        .run_to_completion(&mut grid);

    assert_eq!(SolveStatus::Solved, status);
    assert_eq!(solution, grid.values());
}

fn define_row_cages(grid: &mut Grid) {
    grid.define_killer_cage(&[(0, 0), (0, 1), (0, 2)], 15).unwrap();
    grid.define_killer_cage(&[(0, 3), (0, 4), (0, 5), (0, 6)], 20).unwrap();
}

#[test]
fn cages_added_after_a_pass_yield_innies() {
    let config = SolverConfig::logic_only();
    let mut upfront = grid_with_givens(3, 3, "");
    define_row_cages(&mut upfront);
    GridProgressManager::new(&config).run_to_completion(&mut upfront);

    let mut late = grid_with_givens(3, 3, "");
    let status = GridProgressManager::new(&config).run_to_completion(&mut late);
    assert_ne!(SolveStatus::Unsolvable, status);

    define_row_cages(&mut late);
    let status = GridProgressManager::new(&config).run_to_completion(&mut late);

    // The remaining two cells of the row add up to 10, so neither is a 5.
    assert_ne!(SolveStatus::Unsolvable, status);
    assert!(!late.options_get(0, 7).unwrap().contains(5));
    assert!(!late.options_get(0, 8).unwrap().contains(5));
    assert!(!upfront.options_get(0, 7).unwrap().contains(5));
}

#[test]
fn reset_contents_keeps_regions() {
    let mut grid = grid_with_givens(2, 2, "1... .2.. ..3. ....");
    grid.define_killer_cage(&[(3, 2), (3, 3)], 3).unwrap();
    grid.reset_contents();

    assert!(grid.values().iter().all(|&value| value == 0));
    assert_eq!(13, grid.regions().starting().len());
    assert_eq!(2, grid.options_get(3, 3).unwrap().len());
}
