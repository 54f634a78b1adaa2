//! Tensile test result tables.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use voxsim_math::Axis;
use voxsim_types::VoxsimResult;

/// Geometry of a basic two-region, single-axis box test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicTensile {
    pub axis: Axis,
    /// The region that carries the prescribed displacement.
    pub displaced_region: usize,
    /// Workspace cross section normal to `axis` (m²).
    pub cross_section: f64,
    /// Distance between the end voxel centres (m).
    pub initial_length: f64,
}

/// One displaced region at one strain increment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionReading {
    pub region: usize,
    /// Prescribed displacement magnitude at this increment (m).
    pub displacement: f64,
    /// Reaction force along the displacement (N).
    pub force: f64,
    /// Engineering strain, basic tests only.
    pub strain: Option<f64>,
    /// Engineering stress (Pa), basic tests only.
    pub stress: Option<f64>,
    /// Incremental modulus from the previous increment (Pa).
    pub modulus: Option<f64>,
}

/// All readings of one strain increment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensileRow {
    /// Zero-based increment number.
    pub increment: usize,
    pub readings: Vec<RegionReading>,
    /// Integrator steps spent settling this increment.
    pub steps: u64,
    pub broken_bonds: usize,
    /// False if the increment hit the step cap before settling.
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TensileResults {
    pub basic: Option<BasicTensile>,
    /// Motion threshold in force when the run finished, if any.
    pub threshold: Option<f64>,
    pub rows: Vec<TensileRow>,
}

impl TensileResults {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Strain of every increment, basic tests only.
    pub fn strains(&self) -> Vec<f64> {
        self.basic_column(|r| r.strain)
    }

    /// Stress of every increment (Pa), basic tests only.
    pub fn stresses(&self) -> Vec<f64> {
        self.basic_column(|r| r.stress)
    }

    fn basic_column(&self, f: impl Fn(&RegionReading) -> Option<f64>) -> Vec<f64> {
        let Some(basic) = self.basic else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| {
                row.readings
                    .iter()
                    .find(|r| r.region == basic.displaced_region)
                    .and_then(&f)
            })
            .collect()
    }

    /// Column headers, one group per displaced region.
    pub fn header(&self) -> Vec<String> {
        let Some(first) = self.rows.first() else {
            return Vec::new();
        };
        let mut h = Vec::new();
        for r in &first.readings {
            h.push("Disp (m)".to_string());
            h.push("Force (N)".to_string());
            if self.is_basic_region(r.region) {
                h.push("Strain (%)".to_string());
                h.push("Stress (MPa)".to_string());
                h.push("Modulus (MPa)".to_string());
            }
        }
        h
    }

    fn is_basic_region(&self, region: usize) -> bool {
        self.basic.is_some_and(|b| b.displaced_region == region)
    }

    /// The table with `sep` between fields. Strain is in percent, stress
    /// and modulus in MPa; the first modulus cell is blank.
    pub fn to_table(&self, sep: char) -> String {
        let mut out = self.header().join(&sep.to_string());
        out.push('\n');
        for row in &self.rows {
            let mut cells: Vec<String> = Vec::new();
            for r in &row.readings {
                cells.push(format!("{:e}", r.displacement));
                cells.push(format!("{:e}", r.force));
                if self.is_basic_region(r.region) {
                    cells.push(r.strain.map(|s| format!("{}", s * 100.0)).unwrap_or_default());
                    cells.push(r.stress.map(|s| format!("{}", s / 1e6)).unwrap_or_default());
                    cells.push(r.modulus.map(|m| format!("{}", m / 1e6)).unwrap_or_default());
                }
            }
            out.push_str(&cells.join(&sep.to_string()));
            out.push('\n');
        }
        out
    }

    pub fn to_tsv(&self) -> String {
        self.to_table('\t')
    }

    pub fn to_csv(&self) -> String {
        self.to_table(',')
    }

    /// Writes the tab-separated table to `path`.
    pub fn write_tsv(&self, path: &Path) -> VoxsimResult<()> {
        fs::write(path, self.to_tsv())?;
        Ok(())
    }
}
