//! Camera projection and pointer picking
//!
//! The DAG grows along +z, so the camera trails the newest block and
//! eases toward it. Projection is done CPU-side (the shader only ever
//! sees screen-space discs and segments), which lets pointer picking
//! reuse the exact same math.

use glam::{Vec2, Vec3};

use crate::sim::{Block, BlockKind, BoundedHistory};

/// World distance the camera keeps behind the newest block.
pub const CAMERA_DISTANCE: f32 = 26.0;
/// Projection strength, in units of half the smaller viewport dimension.
pub const FOCAL: f32 = 1.55;
/// Blocks closer than this to the camera plane are culled.
pub const NEAR: f32 = 0.5;
/// How quickly the camera eases toward its target (1/sec).
pub const FOLLOW_RATE: f32 = 2.5;

/// World-space disc radius per category.
pub fn node_radius(kind: BlockKind) -> f32 {
    match kind {
        BlockKind::Normal => 1.0,
        BlockKind::Gold => 1.6,
        BlockKind::Anomaly => 1.3,
    }
}

/// A projected block: screen position in physical pixels plus its
/// on-screen radius and camera depth.
#[derive(Debug, Clone, Copy)]
pub struct ProjectedNode {
    pub screen: Vec2,
    pub radius_px: f32,
    pub depth: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// z of the growth head the camera is easing toward.
    pub focus_z: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self { focus_z: 0.0 }
    }

    /// Ease toward the newest block's z.
    pub fn follow(&mut self, head_z: f32, dt: f32) {
        self.focus_z += (head_z - self.focus_z) * (FOLLOW_RATE * dt).min(1.0);
    }

    fn eye_z(&self) -> f32 {
        self.focus_z + CAMERA_DISTANCE
    }

    /// Project a world position to physical-pixel screen space. Returns
    /// `None` for positions at or behind the near plane.
    pub fn project(&self, pos: Vec3, resolution: (f32, f32)) -> Option<ProjectedNode> {
        let depth = self.eye_z() - pos.z;
        if depth <= NEAR {
            return None;
        }
        let (w, h) = resolution;
        let half_min = w.min(h) * 0.5;
        let px_per_unit = FOCAL * half_min / depth;
        let screen = Vec2::new(w * 0.5 + pos.x * px_per_unit, h * 0.5 - pos.y * px_per_unit);
        Some(ProjectedNode {
            screen,
            radius_px: px_per_unit,
            depth,
        })
    }

    /// Screen radius for a block at the given projection.
    pub fn block_radius_px(&self, block: &Block, projected: &ProjectedNode) -> f32 {
        node_radius(block.kind) * projected.radius_px
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the block under a pointer position, if any. The hit radius is the
/// block's drawn radius with some slack so small, distant discs are still
/// tappable.
pub fn pick_block(
    history: &BoundedHistory,
    camera: &Camera,
    resolution: (f32, f32),
    x: f32,
    y: f32,
) -> Option<u64> {
    let pointer = Vec2::new(x, y);
    let mut best: Option<(u64, f32)> = None;

    for block in history.iter() {
        let Some(projected) = camera.project(block.pos, resolution) else {
            continue;
        };
        let hit_radius = (camera.block_radius_px(block, &projected) * 1.6).max(14.0);
        let dist = pointer.distance(projected.screen);
        if dist <= hit_radius && best.is_none_or(|(_, d)| dist < d) {
            best = Some((block.id, dist));
        }
    }

    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Block;

    const RES: (f32, f32) = (1280.0, 720.0);

    fn block_at(id: u64, pos: Vec3) -> Block {
        Block {
            id,
            pos,
            parents: vec![],
            kind: BlockKind::Normal,
            created_at_ms: 0.0,
            hash: String::new(),
            work: 1.0,
        }
    }

    #[test]
    fn test_centered_block_projects_to_center() {
        let camera = Camera::new();
        let p = camera.project(Vec3::ZERO, RES).unwrap();
        assert!((p.screen.x - 640.0).abs() < 1.0e-3);
        assert!((p.screen.y - 360.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_deeper_blocks_shrink() {
        let camera = Camera {
            focus_z: 100.0,
        };
        let near = camera.project(Vec3::new(0.0, 0.0, 100.0), RES).unwrap();
        let far = camera.project(Vec3::new(0.0, 0.0, 10.0), RES).unwrap();
        assert!(near.radius_px > far.radius_px);
        assert!(near.depth < far.depth);
    }

    #[test]
    fn test_behind_camera_culled() {
        let camera = Camera::new();
        assert!(camera.project(Vec3::new(0.0, 0.0, CAMERA_DISTANCE), RES).is_none());
        assert!(
            camera
                .project(Vec3::new(0.0, 0.0, CAMERA_DISTANCE + 10.0), RES)
                .is_none()
        );
    }

    #[test]
    fn test_follow_converges() {
        let mut camera = Camera::new();
        for _ in 0..200 {
            camera.follow(60.0, 1.0 / 60.0);
        }
        assert!((camera.focus_z - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_pick_hits_block_under_pointer() {
        let mut history = BoundedHistory::new(10);
        history.push(block_at(0, Vec3::ZERO));
        history.push(block_at(1, Vec3::new(8.0, 0.0, 0.0)));
        let camera = Camera::new();

        let target = camera.project(Vec3::new(8.0, 0.0, 0.0), RES).unwrap();
        let hit = pick_block(&history, &camera, RES, target.screen.x, target.screen.y);
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn test_pick_misses_empty_space() {
        let mut history = BoundedHistory::new(10);
        history.push(block_at(0, Vec3::ZERO));
        let camera = Camera::new();
        assert_eq!(pick_block(&history, &camera, RES, 10.0, 10.0), None);
    }

    #[test]
    fn test_pick_prefers_nearest() {
        let mut history = BoundedHistory::new(10);
        history.push(block_at(0, Vec3::new(0.0, 0.0, 0.0)));
        history.push(block_at(1, Vec3::new(0.4, 0.0, 0.0)));
        let camera = Camera::new();

        let target = camera.project(Vec3::new(0.4, 0.0, 0.0), RES).unwrap();
        let hit = pick_block(&history, &camera, RES, target.screen.x + 1.0, target.screen.y);
        assert_eq!(hit, Some(1));
    }
}
