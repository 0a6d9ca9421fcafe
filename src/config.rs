//! This module contains the [SolverConfig], which controls which techniques
//! the [GridProgressManager](crate::solver::GridProgressManager) uses and how
//! far they may go.
//!
//! The configuration can be stored and loaded with serde. Missing fields take
//! their default values, so older configurations stay valid.
//!
//! ```
//! use sudoku_regions::SolverConfig;
//! use sudoku_regions::technique::TechniqueKind;
//!
//! let config = SolverConfig {
//!     max_bifurcation_depth: 1,
//!     ..SolverConfig::default()
//! };
//!
//! assert!(config.is_enabled(TechniqueKind::Fish));
//! assert!(config.is_enabled(TechniqueKind::Bifurcation));
//! ```

use crate::technique::TechniqueKind;

use serde::{Deserialize, Serialize};

fn default_techniques() -> Vec<TechniqueKind> {
    TechniqueKind::ALL.to_vec()
}

fn default_max_fish_size() -> usize {
    4
}

fn default_max_fins() -> usize {
    2
}

fn default_max_bifurcation_depth() -> usize {
    3
}

fn default_true() -> bool {
    true
}

/// The configuration of a solver.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SolverConfig {

    /// The techniques the solver may use. Techniques are always tried in the
    /// order of [TechniqueKind::ALL], regardless of the order in this list.
    #[serde(default = "default_techniques")]
    pub techniques: Vec<TechniqueKind>,

    /// The largest naked or hidden subset that is searched. `None` means
    /// that only the size of the region limits the search.
    #[serde(default)]
    pub max_subset_size: Option<usize>,

    /// The largest fish that is searched, as the number of base regions. The
    /// default of 4 covers X-Wings, Swordfish and Jellyfish. Values below 2
    /// disable fish.
    #[serde(default = "default_max_fish_size")]
    pub max_fish_size: usize,

    /// The largest number of fins a fish may have.
    #[serde(default = "default_max_fins")]
    pub max_fins: usize,

    /// The number of nested bifurcation levels. 0 disables bifurcation.
    #[serde(default = "default_max_bifurcation_depth")]
    pub max_bifurcation_depth: usize,

    /// Whether innies and outies are derived from killer cages.
    #[serde(default = "default_true")]
    pub innies_and_outies: bool,

    /// The seed for the order in which bifurcation tries cells with the same
    /// number of options. Without a seed, the order is random.
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// Whether the brute force solver treats the elimination hints of the
    /// user as constraints by default.
    #[serde(default)]
    pub use_hints_as_constraints: bool
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            techniques: default_techniques(),
            max_subset_size: None,
            max_fish_size: default_max_fish_size(),
            max_fins: default_max_fins(),
            max_bifurcation_depth: default_max_bifurcation_depth(),
            innies_and_outies: true,
            rng_seed: None,
            use_hints_as_constraints: false
        }
    }
}

impl SolverConfig {

    /// Creates a configuration that only allows pure logic, i.e. everything
    /// except bifurcation.
    pub fn logic_only() -> SolverConfig {
        SolverConfig {
            max_bifurcation_depth: 0,
            ..SolverConfig::default()
        }
    }

    /// Indicates whether the technique of the given kind is used, taking the
    /// limits of this configuration into account.
    pub fn is_enabled(&self, kind: TechniqueKind) -> bool {
        if !self.techniques.contains(&kind) {
            return false;
        }

        match kind {
            TechniqueKind::Fish => self.max_fish_size >= 2,
            TechniqueKind::InniesAndOuties => self.innies_and_outies,
            TechniqueKind::Bifurcation => self.max_bifurcation_depth > 0,
            _ => true
        }
    }
}
