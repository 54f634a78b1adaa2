//! Named leaf-material presets.
//!
//! Values are representative of common 3D-printing feedstocks and are meant
//! as starting points for scenarios, not certified data.

use std::collections::HashMap;

use crate::material::Material;
use crate::properties::{FailureMode, LeafProperties, ModelKind};

/// A named collection of leaf presets.
///
/// Presets are looked up by name (e.g., "soft_elastomer", "rigid_polymer").
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    presets: HashMap<String, Material>,
}

impl MaterialLibrary {
    /// Creates a library with the built-in presets.
    pub fn with_defaults() -> Self {
        let mut lib = Self::empty();
        lib.register(default_material());
        lib.register(soft_elastomer());
        lib.register(rigid_polymer());
        lib.register(brittle_resin());
        lib.register(ductile_polymer());
        lib
    }

    pub fn empty() -> Self {
        Self {
            presets: HashMap::new(),
        }
    }

    /// Registers a preset. Overwrites if the name already exists.
    pub fn register(&mut self, material: Material) {
        self.presets.insert(material.name.clone(), material);
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.presets.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.presets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ─── Built-in Presets ────────────────────────────────────────

/// The palette default: 1 MPa, ν = 0.35.
fn default_material() -> Material {
    Material::leaf("default", LeafProperties::new(1.0e6, 0.35))
}

/// Rubber-like elastomer. Large strains, nearly incompressible.
fn soft_elastomer() -> Material {
    let props = LeafProperties {
        density: 1100.0,
        static_friction: 1.2,
        dynamic_friction: 0.8,
        ..LeafProperties::new(6.0e5, 0.49)
    };
    Material::leaf("soft_elastomer", props).with_color(0.1, 0.1, 0.1, 1.0)
}

/// Stiff photopolymer, linear to failure.
fn rigid_polymer() -> Material {
    let props = LeafProperties {
        model_kind: ModelKind::LinearFail,
        failure_mode: FailureMode::MaxStress,
        fail_stress: 5.0e7,
        density: 1180.0,
        cte: 8.0e-5,
        ..LeafProperties::new(1.0e9, 0.35)
    };
    Material::leaf("rigid_polymer", props).with_color(0.9, 0.9, 0.9, 1.0)
}

/// Brittle resin failing at 2% strain.
fn brittle_resin() -> Material {
    let props = LeafProperties {
        model_kind: ModelKind::LinearFail,
        failure_mode: FailureMode::MaxStrain,
        fail_strain: 0.02,
        density: 1200.0,
        ..LeafProperties::new(2.5e9, 0.3)
    };
    Material::leaf("brittle_resin", props).with_color(0.8, 0.6, 0.2, 1.0)
}

/// Ductile polymer with a plastic plateau.
fn ductile_polymer() -> Material {
    let props = LeafProperties {
        model_kind: ModelKind::Bilinear,
        failure_mode: FailureMode::MaxStrain,
        plastic_modulus: 1.0e7,
        yield_stress: 2.0e7,
        fail_strain: 0.5,
        density: 950.0,
        ..LeafProperties::new(1.0e9, 0.42)
    };
    Material::leaf("ductile_polymer", props).with_color(0.2, 0.4, 0.9, 1.0)
}
