//! The material palette.
//!
//! Index 0 is the reserved empty material ("Erase") and is always present.
//! Composite entries reference other entries by index; the palette refuses
//! any edit that would make an entry reachable from itself.

use serde::{Deserialize, Serialize};
use voxsim_types::constants::{MAX_MATERIALS, MAX_RESOLVE_HOPS};
use voxsim_types::{MaterialIndex, VoxsimError, VoxsimResult};

use crate::material::{Material, MaterialKind};
use crate::properties::LeafProperties;

/// Outcome of walking composites down to a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafResolution {
    /// The leaf (or empty) material, or the last index reached when the walk
    /// was cut short.
    pub index: MaterialIndex,
    /// False if any hop along the way was hidden.
    pub visible: bool,
    /// False when the walk hit a cycle, the hop bound, or a malformed composite.
    pub complete: bool,
}

/// Ordered list of materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    materials: Vec<Material>,
}

impl Palette {
    /// A palette holding only the empty material.
    pub fn new() -> Self {
        Self {
            materials: vec![Material::erase()],
        }
    }

    /// Builds a palette from loaded entries without cycle checks.
    ///
    /// Entry 0 is replaced by the empty material if missing.
    pub fn from_materials(mut materials: Vec<Material>) -> VoxsimResult<Self> {
        if materials.is_empty() {
            materials.push(Material::erase());
        }
        if materials.len() > MAX_MATERIALS {
            return Err(VoxsimError::ResourceLimit(format!(
                "palette holds at most {MAX_MATERIALS} materials, got {}",
                materials.len()
            )));
        }
        Ok(Self { materials })
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn get(&self, index: MaterialIndex) -> Option<&Material> {
        self.materials.get(index.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialIndex, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialIndex(i as u8), m))
    }

    pub fn contains(&self, index: MaterialIndex) -> bool {
        index.index() < self.materials.len()
    }

    /// Leaf properties for `index`, or `None` for composites and bad indices.
    pub fn leaf(&self, index: MaterialIndex) -> Option<&LeafProperties> {
        self.get(index).and_then(Material::leaf_properties)
    }

    pub fn find(&self, name: &str) -> Option<MaterialIndex> {
        self.materials
            .iter()
            .position(|m| m.name == name)
            .map(|i| MaterialIndex(i as u8))
    }

    pub fn name_exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// `base`, or `base1`, `base2`, ... until unused.
    pub fn unique_name(&self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while self.name_exists(&name) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    }

    // ─── Edits ───────────────────────────────────────────────

    /// Appends a material, renaming it if the name is taken.
    pub fn add(&mut self, mut material: Material) -> VoxsimResult<MaterialIndex> {
        if material.name.trim().is_empty() {
            return Err(VoxsimError::Validation("invalid material name".into()));
        }
        if self.materials.len() >= MAX_MATERIALS {
            return Err(VoxsimError::ResourceLimit(
                "maximum number of materials reached".into(),
            ));
        }
        let index = MaterialIndex(self.materials.len() as u8);
        self.check_references(index, &material, self.materials.len() + 1)?;

        material.name = self.unique_name(&material.name);
        self.materials.push(material);
        Ok(index)
    }

    /// Appends a linear leaf with palette defaults.
    pub fn add_leaf(
        &mut self,
        name: &str,
        elastic_modulus: f64,
        poissons_ratio: f64,
    ) -> VoxsimResult<MaterialIndex> {
        self.add(Material::leaf(
            name,
            LeafProperties::new(elastic_modulus, poissons_ratio),
        ))
    }

    /// Replaces entry `index` in place. Entry 0 cannot be replaced.
    pub fn set(&mut self, index: MaterialIndex, material: Material) -> VoxsimResult<()> {
        if index.is_empty() {
            return Err(VoxsimError::Validation(
                "cannot modify the reserved empty material".into(),
            ));
        }
        if !self.contains(index) {
            return Err(VoxsimError::Validation(format!(
                "material index {} out of range",
                index.0
            )));
        }
        if material.name != self.materials[index.index()].name && self.name_exists(&material.name)
        {
            return Err(VoxsimError::Validation(format!(
                "material name '{}' already exists",
                material.name
            )));
        }
        self.check_references(index, &material, self.materials.len())?;
        self.materials[index.index()] = material;
        Ok(())
    }

    /// Mutable access to a leaf's properties. Composite references cannot be
    /// changed this way, so no cycle can be introduced.
    pub fn leaf_mut(&mut self, index: MaterialIndex) -> Option<&mut LeafProperties> {
        if index.is_empty() {
            return None;
        }
        self.materials
            .get_mut(index.index())
            .and_then(Material::leaf_properties_mut)
    }

    pub fn set_visible(&mut self, index: MaterialIndex, visible: bool) -> VoxsimResult<()> {
        match self.materials.get_mut(index.index()) {
            Some(m) => {
                m.visible = visible;
                Ok(())
            }
            None => Err(VoxsimError::Validation(format!(
                "material index {} out of range",
                index.0
            ))),
        }
    }

    /// Drops everything except the empty material.
    pub fn clear(&mut self) {
        self.materials.truncate(1);
        if self.materials.is_empty() {
            self.materials.push(Material::erase());
        }
    }

    pub(crate) fn materials_mut(&mut self) -> &mut Vec<Material> {
        &mut self.materials
    }

    fn check_references(
        &self,
        index: MaterialIndex,
        material: &Material,
        bound: usize,
    ) -> VoxsimResult<()> {
        for r in material.references() {
            if r.index() >= bound {
                return Err(VoxsimError::Validation(format!(
                    "'{}' references material {} outside the palette",
                    material.name, r.0
                )));
            }
            if r == index || (r.index() < self.len() && self.is_in_recursive_path(r, index)) {
                return Err(VoxsimError::Recursion(format!(
                    "'{}' would reference itself through material {}",
                    material.name, r.0
                )));
            }
        }
        Ok(())
    }

    // ─── Resolution ──────────────────────────────────────────

    /// True if `target` is reachable from `start` through composite references.
    pub fn is_in_recursive_path(&self, start: MaterialIndex, target: MaterialIndex) -> bool {
        let mut visited = [false; MAX_MATERIALS];
        let mut stack = vec![start];
        while let Some(cur) = stack.pop() {
            if cur == target {
                return true;
            }
            if visited[cur.index()] {
                continue;
            }
            visited[cur.index()] = true;
            if let Some(m) = self.get(cur) {
                stack.extend(m.references());
            }
        }
        false
    }

    /// One composite hop from `material` at local coordinates `coords`.
    ///
    /// Returns `None` when `material` is a leaf, empty, out of range, or an
    /// internal material without a usable sub-lattice.
    pub fn step(
        &self,
        material: MaterialIndex,
        coords: [i64; 3],
    ) -> Option<(MaterialIndex, [i64; 3])> {
        if material.is_empty() {
            return None;
        }
        let [x, y, z] = coords;
        match &self.get(material)?.kind {
            MaterialKind::Leaf(_) => None,
            MaterialKind::Dither(d) => Some((d.choose(x, y, z), coords)),
            MaterialKind::Internal(s) => s.locate(x, y, z),
        }
    }

    /// Walks composites from `start` at outer coordinates `coords`.
    pub fn resolve(&self, start: MaterialIndex, coords: [i64; 3]) -> LeafResolution {
        let mut visible = true;
        let mut current = start;
        let mut coords = coords;
        let mut chain: Vec<MaterialIndex> = Vec::with_capacity(4);

        for _ in 0..MAX_RESOLVE_HOPS {
            let Some(material) = self.get(current) else {
                return LeafResolution {
                    index: MaterialIndex::EMPTY,
                    visible,
                    complete: true,
                };
            };
            if current.is_empty() {
                return LeafResolution {
                    index: current,
                    visible,
                    complete: true,
                };
            }
            if !material.visible {
                visible = false;
            }
            if material.is_leaf() {
                return LeafResolution {
                    index: current,
                    visible,
                    complete: true,
                };
            }
            let Some((next, local)) = self.step(current, coords) else {
                return LeafResolution {
                    index: current,
                    visible,
                    complete: false,
                };
            };
            chain.push(current);
            if chain.contains(&next) {
                return LeafResolution {
                    index: current,
                    visible,
                    complete: false,
                };
            }
            current = next;
            coords = local;
        }

        LeafResolution {
            index: current,
            visible,
            complete: false,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}
