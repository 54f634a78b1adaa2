//! Run input/output contract types.
//!
//! A [`RunConfig`] is the TOML file the CLI consumes: which documents to
//! load, how to simulate them and where to put the results. A
//! [`RunSummary`] is what a finished run reports back.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use voxsim_solver::{PhysicsConfig, SimStats};
use voxsim_tensile::TensileParams;
use voxsim_types::{VoxsimError, VoxsimResult};

/// Complete description of one simulation or tensile run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Structure document to simulate.
    pub structure: PathBuf,
    /// Boundary-condition document. `None` runs unconstrained.
    #[serde(default)]
    pub boundaries: Option<PathBuf>,
    /// Step cap for plain runs, on top of the physics stop condition.
    #[serde(default)]
    pub max_steps: Option<u64>,
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Present for tensile runs.
    #[serde(default)]
    pub tensile: Option<TensileParams>,
    #[serde(default)]
    pub output: OutputPaths,
}

/// Where a run writes its results. Every output is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    /// Per-step statistics as CSV.
    pub stats_csv: Option<PathBuf>,
    /// Record a statistics row every this many steps.
    pub stats_every: u64,
    /// Tensile result table (tab separated).
    pub tensile_table: Option<PathBuf>,
    /// Final kinematic snapshot.
    pub snapshot: Option<PathBuf>,
    /// Run summary as JSON.
    pub summary: Option<PathBuf>,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            stats_csv: None,
            stats_every: 100,
            tensile_table: None,
            snapshot: None,
            summary: None,
        }
    }
}

impl OutputPaths {
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        [
            &self.stats_csv,
            &self.tensile_table,
            &self.snapshot,
            &self.summary,
        ]
        .into_iter()
        .flatten()
    }
}

impl RunConfig {
    /// A plain run of `structure` with default physics.
    pub fn new(structure: impl Into<PathBuf>) -> Self {
        Self {
            structure: structure.into(),
            boundaries: None,
            max_steps: None,
            physics: PhysicsConfig::default(),
            tensile: None,
            output: OutputPaths::default(),
        }
    }

    pub fn from_toml_str(input: &str) -> VoxsimResult<Self> {
        toml::from_str(input).map_err(|e| VoxsimError::Serialization(e.to_string()))
    }

    pub fn to_toml_string(&self) -> VoxsimResult<String> {
        toml::to_string_pretty(self).map_err(|e| VoxsimError::Serialization(e.to_string()))
    }

    /// Reads a config file. Relative paths inside it are taken relative to
    /// the file's directory.
    pub fn load(path: &Path) -> VoxsimResult<Self> {
        let mut config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        if let Some(dir) = path.parent() {
            config.resolve_relative_to(dir);
        }
        Ok(config)
    }

    /// Prefixes every relative path with `dir`.
    pub fn resolve_relative_to(&mut self, dir: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        fix(&mut self.structure);
        let out = &mut self.output;
        for p in [
            &mut self.boundaries,
            &mut out.stats_csv,
            &mut out.tensile_table,
            &mut out.snapshot,
            &mut out.summary,
        ]
        .into_iter()
        .flatten()
        {
            fix(p);
        }
    }

    pub fn is_tensile(&self) -> bool {
        self.tensile.is_some()
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub voxel_count: usize,
    pub bond_count: usize,
    pub steps: u64,
    /// Simulated time (s).
    pub sim_time: f64,
    pub wall_time_seconds: f64,
    /// Time step used (s).
    pub dt: f64,
    /// Whether the stop condition ended the run.
    pub stop_reached: bool,
    pub final_stats: SimStats,
}

impl RunSummary {
    pub fn to_json(&self) -> VoxsimResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| VoxsimError::Serialization(e.to_string()))
    }
}
