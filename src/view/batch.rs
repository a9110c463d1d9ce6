//! Per-frame draw lists.
//!
//! Turns the world and the remaining collectibles into instance data grouped
//! by mesh and pipeline. Nothing here touches the GPU, so the grouping is
//! testable on its own.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::model::{CollectibleSet, Finish, Shape, World};
use crate::model::world::{COLLECTIBLE_GOLD, NEON_GREEN};

/// Render size of a collectible gem.
pub const GEM_SCALE: f32 = 4.0;
/// Self-illumination of flat bodies so they read as neon away from the light.
const FLAT_GLOW: f32 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MeshKind {
    Grid,
    Cube,
    Sphere,
    Cone,
    Gem,
}

impl From<Shape> for MeshKind {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Cube => MeshKind::Cube,
            Shape::Sphere => MeshKind::Sphere,
            Shape::Cone => MeshKind::Cone,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 3],
    pub emissive: f32,
}

impl InstanceRaw {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceRaw>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &wgpu::vertex_attr_array![
            1 => Float32x4, 2 => Float32x4, 3 => Float32x4, 4 => Float32x4,
            5 => Float32x3, 6 => Float32
        ],
    };

    pub fn new(model: Mat4, color: [f32; 4], emissive: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: [color[0], color[1], color[2]],
            emissive,
        }
    }
}

pub struct Batch {
    pub mesh: MeshKind,
    pub instances: Vec<InstanceRaw>,
}

/// Line-list batches (grid, wireframes) and filled batches (flat bodies,
/// gems), each sorted by mesh.
#[derive(Default)]
pub struct SceneBatches {
    pub lines: Vec<Batch>,
    pub fills: Vec<Batch>,
}

impl SceneBatches {
    pub fn instance_count(&self) -> usize {
        self.lines
            .iter()
            .chain(self.fills.iter())
            .map(|b| b.instances.len())
            .sum()
    }
}

fn into_batches(map: BTreeMap<MeshKind, Vec<InstanceRaw>>) -> Vec<Batch> {
    map.into_iter()
        .filter(|(_, instances)| !instances.is_empty())
        .map(|(mesh, instances)| Batch { mesh, instances })
        .collect()
}

pub fn build_batches(world: &World, collectibles: &CollectibleSet) -> SceneBatches {
    let mut lines: BTreeMap<MeshKind, Vec<InstanceRaw>> = BTreeMap::new();
    let mut fills: BTreeMap<MeshKind, Vec<InstanceRaw>> = BTreeMap::new();

    lines
        .entry(MeshKind::Grid)
        .or_default()
        .push(InstanceRaw::new(Mat4::IDENTITY, NEON_GREEN, 0.0));

    for body in &world.bodies {
        let look = &body.appearance;
        let model = body.model_matrix();
        match look.finish {
            Finish::Wireframe => lines
                .entry(look.shape.into())
                .or_default()
                .push(InstanceRaw::new(model, look.color, 0.0)),
            Finish::Flat => fills
                .entry(look.shape.into())
                .or_default()
                .push(InstanceRaw::new(model, look.color, FLAT_GLOW)),
        }
    }

    // Collected items leave the renderable set.
    for item in collectibles.remaining() {
        fills
            .entry(MeshKind::Gem)
            .or_default()
            .push(InstanceRaw::new(item.model_matrix(GEM_SCALE), COLLECTIBLE_GOLD, 0.6));
    }

    SceneBatches {
        lines: into_batches(lines),
        fills: into_batches(fills),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PickupConfig, WorldConfig};
    use crate::model::world::scatter_collectibles;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scene() -> (World, CollectibleSet) {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let world = World::build(&WorldConfig::default(), &mut rng);
        let items = scatter_collectibles(&PickupConfig::default(), Vec3::new(0.0, 2.0, 0.0), &mut rng);
        (world, CollectibleSet::new(items))
    }

    fn count(batches: &[Batch], mesh: MeshKind) -> usize {
        batches.iter().filter(|b| b.mesh == mesh).map(|b| b.instances.len()).sum()
    }

    #[test]
    fn every_body_lands_in_exactly_one_batch() {
        let (world, items) = scene();
        let batches = build_batches(&world, &items);
        // Grid + bodies + gems.
        assert_eq!(batches.instance_count(), 1 + world.bodies.len() + items.total());
        assert_eq!(count(&batches.lines, MeshKind::Grid), 1);
        assert_eq!(count(&batches.fills, MeshKind::Gem), items.total());

        let wire = world.bodies.iter().filter(|b| b.appearance.finish == Finish::Wireframe).count();
        let wire_batched: usize = batches
            .lines
            .iter()
            .filter(|b| b.mesh != MeshKind::Grid)
            .map(|b| b.instances.len())
            .sum();
        assert_eq!(wire, wire_batched);
    }

    #[test]
    fn collected_gems_are_not_drawn() {
        let (world, mut items) = scene();
        let first = items.all()[0].position;
        items.collect_near(first, 0.5);
        let batches = build_batches(&world, &items);
        assert_eq!(count(&batches.fills, MeshKind::Gem), items.total() - items.collected_count());
    }

    #[test]
    fn batches_are_sorted_and_non_empty() {
        let (world, items) = scene();
        let batches = build_batches(&world, &items);
        for list in [&batches.lines, &batches.fills] {
            assert!(list.windows(2).all(|w| w[0].mesh < w[1].mesh));
            assert!(list.iter().all(|b| !b.instances.is_empty()));
        }
    }

    #[test]
    fn instance_layout_matches_struct_size() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 80);
        assert_eq!(InstanceRaw::LAYOUT.array_stride, 80);
    }
}
