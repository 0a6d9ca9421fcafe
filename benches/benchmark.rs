use criterion::{
    criterion_group,
    criterion_main,
    BenchmarkGroup,
    Criterion,
    SamplingMode
};
use criterion::measurement::WallTime;

use serde::Deserialize;

use sudoku_regions::{Grid, SolverConfig};
use sudoku_regions::exact_cover::{BruteForceSolver, SolutionCount};
use sudoku_regions::solver::{GridProgressManager, SolveStatus};

use std::fs;
use std::time::Duration;

// Explanation of benchmark classes:
//
// logic: A GridProgressManager with all techniques and a bifurcation depth of
//        1, run to completion on every puzzle.
// brute force: A BruteForceSolver checking that every puzzle has a unique
//              solution.
// counting: A BruteForceSolver counting all 288 solutions of the empty 4x4
//           grid.

const MEASUREMENT_TIME_SECS: u64 = 30;
const SAMPLE_SIZE: usize = 50;

const BENCHDATA_DIR: &str = "benchdata/";
const TASK_FILE_EXT: &str = ".json";

#[derive(Deserialize)]
struct Cage {
    cells: Vec<(usize, usize)>,
    total: usize
}

#[derive(Deserialize)]
struct Task {
    puzzle: String,
    solution: String,
    #[serde(default)]
    cages: Vec<Cage>
}

#[derive(Deserialize)]
struct Tasks {
    block_width: usize,
    block_height: usize,
    tasks: Vec<Task>
}

fn digits(code: &str) -> Vec<usize> {
    code.chars()
        .map(|c| c.to_digit(10).unwrap() as usize)
        .collect()
}

fn load_tasks(id: &str) -> Tasks {
    let mut file = String::from(BENCHDATA_DIR);
    file.push_str(id);
    file.push_str(TASK_FILE_EXT);
    let json = fs::read_to_string(file).unwrap();
    serde_json::from_str(&json).unwrap()
}

fn build_grid(tasks: &Tasks, task: &Task) -> Grid {
    let mut grid = Grid::new(tasks.block_width, tasks.block_height).unwrap();
    grid.define_standard_regions().unwrap();

    for cage in task.cages.iter() {
        grid.define_killer_cage(&cage.cells, cage.total).unwrap();
    }

    let size = grid.size();

    for (cell, value) in digits(&task.puzzle).into_iter().enumerate() {
        grid.add_given_cell(cell / size, cell % size, value).unwrap();
    }

    grid
}

fn solve_logically(grids: &[Grid], config: &SolverConfig) {
    for grid in grids {
        let mut grid = grid.clone();
        let status = GridProgressManager::new(config)
            .run_to_completion(&mut grid);
        assert_ne!(SolveStatus::Unsolvable, status);
    }
}

fn solve_brute_force(grids: &[Grid], solutions: &[Vec<usize>]) {
    for (grid, solution) in grids.iter().zip(solutions.iter()) {
        let result = BruteForceSolver::new().generate_solutions(grid, 2, false);
        assert_eq!(SolutionCount::Unique(solution.clone()),
            result.solution_count());
    }
}

fn benchmark_tasks(group: &mut BenchmarkGroup<WallTime>, id: &str) {
    let tasks = load_tasks(id);
    let grids: Vec<Grid> = tasks.tasks.iter()
        .map(|task| build_grid(&tasks, task))
        .collect();
    let solutions: Vec<Vec<usize>> = tasks.tasks.iter()
        .map(|task| digits(&task.solution))
        .collect();
    let config = SolverConfig {
        max_bifurcation_depth: 1,
        rng_seed: Some(0),
        ..SolverConfig::default()
    };

    group.measurement_time(Duration::from_secs(MEASUREMENT_TIME_SECS));
    group.sample_size(SAMPLE_SIZE);
    group.sampling_mode(SamplingMode::Flat);
    group.bench_function(format!("{} logic", id),
        |b| b.iter(|| solve_logically(&grids, &config)));
    group.bench_function(format!("{} brute force", id),
        |b| b.iter(|| solve_brute_force(&grids, &solutions)));
}

fn benchmark_puzzles(c: &mut Criterion) {
    let mut group = c.benchmark_group("puzzles");
    benchmark_tasks(&mut group, "classic");
    benchmark_tasks(&mut group, "killer");
}

fn benchmark_counting(c: &mut Criterion) {
    let mut grid = Grid::new(2, 2).unwrap();
    grid.define_standard_regions().unwrap();

    c.bench_function("counting", |b| b.iter(|| {
        let result = BruteForceSolver::new().generate_solutions(&grid, 1000,
            false);
        assert_eq!(288, result.solutions.len());
    }));
}

criterion_group!(all,
    benchmark_puzzles,
    benchmark_counting
);

criterion_main!(all);
