use glam::Vec3;
use ruin_survival_collision::Sphere;
use ruin_survival_core::{ProjectileConfig, ProjectileSlot, ProjectileSnapshot};

#[derive(Clone, Copy, Debug)]
struct Projectile {
    center: Vec3,
    velocity: Vec3,
    active: bool,
}

/// Fixed-capacity ring of projectiles reused cyclically.
///
/// Inactive slots are parked at a sentinel height for presentation, but
/// activity is always read from the explicit flag.
#[derive(Clone, Debug)]
pub(crate) struct ProjectilePool {
    slots: Vec<Projectile>,
    cursor: usize,
    radius: f32,
    parked: Vec3,
}

impl ProjectilePool {
    pub(crate) fn new(config: &ProjectileConfig) -> Self {
        let parked = Vec3::new(0.0, config.parked_height, 0.0);
        Self {
            slots: vec![
                Projectile {
                    center: parked,
                    velocity: Vec3::ZERO,
                    active: false,
                };
                config.pool_size.max(1)
            ],
            cursor: 0,
            radius: config.radius,
            parked,
        }
    }

    /// Activates the slot under the cursor and advances the cursor.
    ///
    /// The oldest projectile is overwritten when every slot is in flight.
    pub(crate) fn launch(&mut self, origin: Vec3, velocity: Vec3) -> ProjectileSlot {
        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.slots.len();
        self.slots[index] = Projectile {
            center: origin,
            velocity,
            active: true,
        };
        ProjectileSlot::new(index as u32)
    }

    pub(crate) fn set(&mut self, slot: ProjectileSlot, center: Vec3, velocity: Vec3) -> bool {
        match self.slots.get_mut(slot.index()) {
            Some(projectile) if projectile.active => {
                if !center.is_finite() || !velocity.is_finite() {
                    return false;
                }
                projectile.center = center;
                projectile.velocity = velocity;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn park(&mut self, slot: ProjectileSlot) -> bool {
        match self.slots.get_mut(slot.index()) {
            Some(projectile) if projectile.active => {
                projectile.active = false;
                projectile.center = self.parked;
                projectile.velocity = Vec3::ZERO;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn reset(&mut self) {
        for projectile in &mut self.slots {
            projectile.active = false;
            projectile.center = self.parked;
            projectile.velocity = Vec3::ZERO;
        }
        self.cursor = 0;
    }

    pub(crate) fn snapshots(&self) -> Vec<ProjectileSnapshot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, projectile)| ProjectileSnapshot {
                slot: ProjectileSlot::new(index as u32),
                sphere: Sphere::new(projectile.center, self.radius),
                velocity: projectile.velocity,
                active: projectile.active,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(size: usize) -> ProjectilePool {
        ProjectilePool::new(&ProjectileConfig {
            pool_size: size,
            ..ProjectileConfig::default()
        })
    }

    #[test]
    fn launches_wrap_around_the_ring() {
        let mut pool = pool(3);
        let slots: Vec<u32> = (0..4)
            .map(|_| pool.launch(Vec3::ZERO, Vec3::X).get())
            .collect();
        assert_eq!(slots, vec![0, 1, 2, 0]);
        assert_eq!(pool.snapshots().len(), 3);
    }

    #[test]
    fn parked_slots_ignore_updates() {
        let mut pool = pool(2);
        let slot = pool.launch(Vec3::Y, Vec3::X);
        assert!(pool.park(slot));
        assert!(!pool.park(slot));
        assert!(!pool.set(slot, Vec3::ZERO, Vec3::ZERO));

        let snapshot = pool.snapshots()[slot.index()];
        assert!(!snapshot.active);
        assert_eq!(snapshot.sphere.center.y, -100.0);
    }

    #[test]
    fn out_of_range_slots_are_rejected() {
        let mut pool = pool(1);
        assert!(!pool.park(ProjectileSlot::new(7)));
        assert!(!pool.set(ProjectileSlot::new(7), Vec3::ZERO, Vec3::ZERO));
    }
}
