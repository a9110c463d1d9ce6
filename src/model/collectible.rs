use glam::{Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collectible {
    pub position: Vec3,
    /// Current spin angle about Y, radians.
    pub spin: f32,
    collected: bool,
}

impl Collectible {
    pub fn new(position: Vec3) -> Self {
        Self { position, spin: 0.0, collected: false }
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Strictly inside `radius` of `player`.
    pub fn in_reach(&self, player: Vec3, radius: f32) -> bool {
        self.position.distance(player) < radius
    }

    pub fn model_matrix(&self, scale: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(scale),
            Quat::from_rotation_y(self.spin),
            self.position,
        )
    }
}

/// The pickups of one stage. Collection is one-way: an item never returns
/// to the traversable set and the counter never goes down.
#[derive(Clone, Debug, Default)]
pub struct CollectibleSet {
    items: Vec<Collectible>,
    collected: usize,
}

impl CollectibleSet {
    pub fn new(positions: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            items: positions.into_iter().map(Collectible::new).collect(),
            collected: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn collected_count(&self) -> usize {
        self.collected
    }

    pub fn is_complete(&self) -> bool {
        !self.items.is_empty() && self.collected == self.items.len()
    }

    pub fn all(&self) -> &[Collectible] {
        &self.items
    }

    /// Items still in the world.
    pub fn remaining(&self) -> impl Iterator<Item = &Collectible> {
        self.items.iter().filter(|c| !c.collected)
    }

    pub fn spin(&mut self, rate: f32, dt: f32) {
        for item in self.items.iter_mut().filter(|c| !c.collected) {
            item.spin = (item.spin + rate * dt) % std::f32::consts::TAU;
        }
    }

    /// Collect every remaining item within `radius` of `player` and return
    /// their indices. Already collected items are skipped.
    pub fn collect_near(&mut self, player: Vec3, radius: f32) -> Vec<usize> {
        let mut picked = Vec::new();
        for (idx, item) in self.items.iter_mut().enumerate() {
            if !item.collected && item.in_reach(player, radius) {
                item.collected = true;
                picked.push(idx);
            }
        }
        self.collected += picked.len();
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_radius_is_strict() {
        let target = Vec3::new(100.0, 50.0, 100.0);
        let mut set = CollectibleSet::new([target]);

        assert!(set.collect_near(target + Vec3::new(18.1, 0.0, 0.0), 18.0).is_empty());
        assert_eq!(set.collected_count(), 0);

        assert_eq!(set.collect_near(target + Vec3::new(0.0, 0.0, 17.9), 18.0), vec![0]);
        assert_eq!(set.collected_count(), 1);
        assert!(set.is_complete());
    }

    #[test]
    fn collection_is_idempotent() {
        let mut set = CollectibleSet::new([Vec3::ZERO, Vec3::new(500.0, 0.0, 0.0)]);
        assert_eq!(set.collect_near(Vec3::ZERO, 18.0).len(), 1);
        for _ in 0..10 {
            assert!(set.collect_near(Vec3::ZERO, 18.0).is_empty());
        }
        assert_eq!(set.collected_count(), 1);
        assert_eq!(set.remaining().count(), 1);
        assert!(!set.is_complete());
    }

    #[test]
    fn collected_items_stop_spinning() {
        let mut set = CollectibleSet::new([Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)]);
        set.spin(1.0, 0.5);
        set.collect_near(Vec3::ZERO, 1.0);
        set.spin(1.0, 0.5);
        assert!((set.all()[0].spin - 0.5).abs() < 1e-6);
        assert!((set.all()[1].spin - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_set_is_never_complete() {
        assert!(!CollectibleSet::default().is_complete());
    }
}
