//! Run configuration and document validation.
//!
//! Catches data-level problems before the simulator receives them, with
//! messages that name the offending path, material or region.

use std::collections::HashSet;

use voxsim_boundary::BoundarySet;
use voxsim_material::{MaterialKind, VoxelObject};
use voxsim_solver::StopKind;
use voxsim_types::{MaterialIndex, VoxsimError, VoxsimResult};

use crate::contract::RunConfig;

/// Validates a run configuration.
///
/// Checks:
/// - The structure document (and boundary document, if named) exist
/// - Physics and tensile parameters are in range
/// - Plain runs have an end: a step cap or a stop condition
/// - Tensile runs name a boundary document
/// - Output paths are distinct and their directories exist
pub fn validate_run_config(config: &RunConfig) -> VoxsimResult<()> {
    if config.structure.as_os_str().is_empty() {
        return Err(VoxsimError::InvalidConfig(
            "structure document path is empty".into(),
        ));
    }
    if !config.structure.is_file() {
        return Err(VoxsimError::InvalidConfig(format!(
            "structure document not found: {}",
            config.structure.display()
        )));
    }
    if let Some(ref bcs) = config.boundaries {
        if !bcs.is_file() {
            return Err(VoxsimError::InvalidConfig(format!(
                "boundary document not found: {}",
                bcs.display()
            )));
        }
    }

    config.physics.validate()?;

    if config.max_steps == Some(0) {
        return Err(VoxsimError::InvalidConfig(
            "max_steps must be >= 1 when given".into(),
        ));
    }

    if config.tensile.is_none()
        && config.max_steps.is_none()
        && config.physics.stop.kind == StopKind::None
    {
        return Err(VoxsimError::InvalidConfig(
            "plain runs need max_steps or a physics stop condition".into(),
        ));
    }

    if let Some(ref tensile) = config.tensile {
        tensile.validate()?;
        if config.boundaries.is_none() {
            return Err(VoxsimError::InvalidConfig(
                "tensile runs need a boundary document with a displaced region".into(),
            ));
        }
    }

    let out = &config.output;
    if out.stats_every == 0 {
        return Err(VoxsimError::InvalidConfig(
            "output.stats_every must be >= 1".into(),
        ));
    }
    let mut seen = HashSet::new();
    for path in out.iter() {
        if !seen.insert(path) {
            return Err(VoxsimError::InvalidConfig(format!(
                "output path used twice: {}",
                path.display()
            )));
        }
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.is_dir() {
                return Err(VoxsimError::InvalidConfig(format!(
                    "output directory does not exist: {}",
                    dir.display()
                )));
            }
        }
    }
    Ok(())
}

/// Validates a loaded object before simulation.
pub fn validate_object(object: &VoxelObject) -> VoxsimResult<()> {
    let l = &object.lattice;
    for (name, v) in [
        ("lattice_dim", l.lattice_dim),
        ("x_dim_adj", l.x_dim_adj),
        ("y_dim_adj", l.y_dim_adj),
        ("z_dim_adj", l.z_dim_adj),
    ] {
        if !(v.is_finite() && v > 0.0) {
            return Err(VoxsimError::Validation(format!(
                "lattice {name} must be positive, got {v}"
            )));
        }
    }

    if object.voxel_count() == 0 {
        return Err(VoxsimError::Validation("structure has no voxels".into()));
    }

    for (index, material) in object.palette.iter() {
        if !material.is_composite() {
            continue;
        }
        if material
            .references()
            .into_iter()
            .any(|r| object.palette.is_in_recursive_path(r, index))
        {
            return Err(VoxsimError::Recursion(format!(
                "material {} ('{}') references itself",
                index.0, material.name
            )));
        }
        if let MaterialKind::Dither(d) = &material.kind {
            if d.first == MaterialIndex::EMPTY && d.second == MaterialIndex::EMPTY {
                return Err(VoxsimError::Validation(format!(
                    "dither material '{}' mixes only empty space",
                    material.name
                )));
            }
        }
    }

    for index in object.leaf_indices_in_use() {
        let Some(material) = object.palette.get(index) else {
            continue;
        };
        let Some(leaf) = material.leaf_properties() else {
            continue;
        };
        if !(leaf.elastic_modulus.is_finite() && leaf.elastic_modulus > 0.0) {
            return Err(VoxsimError::Validation(format!(
                "material '{}' has non-positive elastic modulus {}",
                material.name, leaf.elastic_modulus
            )));
        }
        if !(leaf.density.is_finite() && leaf.density > 0.0) {
            return Err(VoxsimError::Validation(format!(
                "material '{}' has non-positive density {}",
                material.name, leaf.density
            )));
        }
        if !(-1.0..=0.5).contains(&leaf.poissons_ratio) {
            return Err(VoxsimError::Validation(format!(
                "material '{}' has Poisson's ratio {} outside [-1, 0.5]",
                material.name, leaf.poissons_ratio
            )));
        }
    }
    Ok(())
}

/// Validates boundary regions: finite geometry and loads, non-negative sizes.
pub fn validate_boundaries(boundaries: &BoundarySet) -> VoxsimResult<()> {
    for (i, region) in boundaries.iter().enumerate() {
        let p = &region.primitive;
        let finite = p.position.is_finite()
            && p.size.is_finite()
            && p.radius.is_finite()
            && region.force().is_finite()
            && region.torque().is_finite()
            && region.displace().is_finite()
            && region.ang_displace().is_finite();
        if !finite {
            return Err(VoxsimError::Validation(format!(
                "boundary region {i} has a non-finite value"
            )));
        }
        if p.size.min_element() < 0.0 || p.radius < 0.0 {
            return Err(VoxsimError::Validation(format!(
                "boundary region {i} has a negative size or radius"
            )));
        }
    }
    Ok(())
}
