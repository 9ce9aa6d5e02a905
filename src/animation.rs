//! Skinned meshes, animation clips, and the offline animation baker.
//!
//! The baker samples a skeletal clip at a power-of-two number of evenly
//! spaced times, skins the mesh on the CPU at each sample, and packs every
//! deformed vertex position into one flat table indexed by
//! `vertex * frame_count + frame`. All frames of a vertex are contiguous, so
//! the render shader addresses a pose with plain integer arithmetic.
//!
//! Baking is O(frame_count * vertex_count) and runs once at load, never
//! per frame. Asset *import* is out of scope; these types describe rigged
//! geometry already in memory.

use glam::{Mat4, Quat, Vec3, Vec4};

/// One bone of a skeleton. Joints are stored parent-before-child.
#[derive(Clone, Debug)]
pub struct Joint {
    /// Index of the parent joint, `None` for the root.
    pub parent: Option<usize>,
    /// Inverse of the joint's bind-pose global transform.
    pub inverse_bind: Mat4,
    /// Rest-pose local translation, used when a clip has no channel for
    /// this joint.
    pub rest_translation: Vec3,
    /// Rest-pose local rotation.
    pub rest_rotation: Quat,
}

#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    pub joints: Vec<Joint>,
}

/// Keyframed local-space animation for one joint.
///
/// Key times must be ascending. Rotations are slerped, translations lerped;
/// sampling clamps at both ends.
#[derive(Clone, Debug)]
pub struct JointChannel {
    pub joint: usize,
    pub rotations: Vec<(f32, Quat)>,
    pub translations: Vec<(f32, Vec3)>,
}

/// A skeletal animation clip.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    /// Clip length in seconds.
    pub length: f32,
    /// Authored samples per second.
    pub frame_rate: f32,
    pub channels: Vec<JointChannel>,
}

/// Index range of one submesh (one material slot, one draw call).
#[derive(Clone, Copy, Debug)]
pub struct SubMesh {
    pub index_start: u32,
    pub index_count: u32,
    pub base_vertex: u32,
}

/// A rigged mesh with up to four joint influences per vertex.
#[derive(Clone, Debug)]
pub struct SkinnedMesh {
    /// Bind-pose vertex positions.
    pub positions: Vec<Vec3>,
    /// Bind-pose normals, used for shading only.
    pub normals: Vec<Vec3>,
    /// Joint indices per vertex.
    pub joints: Vec<[u16; 4]>,
    /// Influence weights per vertex; expected to sum to 1.
    pub weights: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
}

impl SkinnedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Output of the baker: a flat `(vertex, frame)` position table.
#[derive(Clone, Debug)]
pub struct BakedAnimation {
    /// `vertex_count * frame_count` entries, vertex-major. The fourth
    /// component is always 1 so the shader can treat entries as points.
    pub table: Vec<[f32; 4]>,
    pub frame_count: u32,
    pub vertex_count: u32,
}

impl BakedAnimation {
    /// Baked position of `vertex` at `frame`.
    pub fn sample(&self, vertex: u32, frame: u32) -> Vec3 {
        let entry = self.table[(vertex * self.frame_count + frame) as usize];
        Vec3::new(entry[0], entry[1], entry[2])
    }
}

/// Largest power of two that is <= `n`, and at least 1.
///
/// A clip shorter than one sample period still bakes frame 0.
pub fn frame_count_for(frame_rate: f32, length: f32) -> u32 {
    let natural = (frame_rate * length) as u32;
    if natural <= 1 {
        1
    } else {
        1 << (31 - natural.leading_zeros())
    }
}

/// Bake `clip` applied to `mesh` into a flat per-vertex-per-frame table.
pub fn bake(mesh: &SkinnedMesh, skeleton: &Skeleton, clip: &AnimationClip) -> BakedAnimation {
    let frame_count = frame_count_for(clip.frame_rate, clip.length);
    let per_frame_time = clip.length / frame_count as f32;
    let vertex_count = mesh.vertex_count();

    let mut table = vec![[0.0f32; 4]; vertex_count * frame_count as usize];
    for frame in 0..frame_count {
        let skin = skin_matrices(skeleton, clip, frame as f32 * per_frame_time);
        for (v, position) in mesh.positions.iter().enumerate() {
            let deformed = skin_vertex(*position, &mesh.joints[v], &mesh.weights[v], &skin);
            table[v * frame_count as usize + frame as usize] = deformed.extend(1.0).to_array();
        }
    }

    BakedAnimation {
        table,
        frame_count,
        vertex_count: vertex_count as u32,
    }
}

/// Evaluate the skeleton at `time` and return one skinning matrix per joint.
fn skin_matrices(skeleton: &Skeleton, clip: &AnimationClip, time: f32) -> Vec<Mat4> {
    let joint_count = skeleton.joints.len();
    let mut globals = vec![Mat4::IDENTITY; joint_count];
    let mut skins = vec![Mat4::IDENTITY; joint_count];

    for (i, joint) in skeleton.joints.iter().enumerate() {
        let (rotation, translation) = sample_pose(joint, clip.channel_for(i), time);
        let local = Mat4::from_rotation_translation(rotation, translation);
        globals[i] = match joint.parent {
            Some(p) => globals[p] * local,
            None => local,
        };
        skins[i] = globals[i] * joint.inverse_bind;
    }

    skins
}

impl AnimationClip {
    fn channel_for(&self, joint: usize) -> Option<&JointChannel> {
        self.channels.iter().find(|c| c.joint == joint)
    }
}

fn sample_pose(joint: &Joint, channel: Option<&JointChannel>, time: f32) -> (Quat, Vec3) {
    match channel {
        Some(channel) => {
            let rotation = sample_keys(&channel.rotations, time, joint.rest_rotation, |a, b, t| {
                a.slerp(b, t)
            });
            let translation =
                sample_keys(&channel.translations, time, joint.rest_translation, |a, b, t| {
                    a.lerp(b, t)
                });
            (rotation, translation)
        }
        None => (joint.rest_rotation, joint.rest_translation),
    }
}

fn sample_keys<T: Copy>(keys: &[(f32, T)], time: f32, rest: T, lerp: impl Fn(T, T, f32) -> T) -> T {
    match keys {
        [] => rest,
        [(_, only)] => *only,
        _ => {
            let (first_time, first) = keys[0];
            if time <= first_time {
                return first;
            }
            for pair in keys.windows(2) {
                let (t0, a) = pair[0];
                let (t1, b) = pair[1];
                if time < t1 {
                    let span = (t1 - t0).max(f32::EPSILON);
                    return lerp(a, b, (time - t0) / span);
                }
            }
            keys[keys.len() - 1].1
        }
    }
}

fn skin_vertex(position: Vec3, joints: &[u16; 4], weights: &[f32; 4], skins: &[Mat4]) -> Vec3 {
    let mut out = Vec4::ZERO;
    for i in 0..4 {
        if weights[i] > 0.0 {
            out += skins[joints[i] as usize] * position.extend(1.0) * weights[i];
        }
    }
    out.truncate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn single_joint_skeleton() -> Skeleton {
        Skeleton {
            joints: vec![Joint {
                parent: None,
                inverse_bind: Mat4::IDENTITY,
                rest_translation: Vec3::ZERO,
                rest_rotation: Quat::IDENTITY,
            }],
        }
    }

    fn quad_mesh() -> SkinnedMesh {
        SkinnedMesh {
            positions: vec![
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            normals: vec![Vec3::Z; 3],
            joints: vec![[0, 0, 0, 0]; 3],
            weights: vec![[1.0, 0.0, 0.0, 0.0]; 3],
            indices: vec![0, 1, 2],
            submeshes: vec![SubMesh {
                index_start: 0,
                index_count: 3,
                base_vertex: 0,
            }],
        }
    }

    fn static_clip(length: f32, frame_rate: f32) -> AnimationClip {
        AnimationClip {
            length,
            frame_rate,
            channels: vec![],
        }
    }

    #[test]
    fn frame_count_is_power_of_two_and_positive() {
        for (rate, length) in [(30.0, 1.0), (24.0, 2.5), (60.0, 0.4), (30.0, 0.001), (30.0, 0.0)]
        {
            let n = frame_count_for(rate, length);
            assert!(n >= 1);
            assert!(n.is_power_of_two(), "{} not a power of two", n);
        }
    }

    #[test]
    fn frame_count_rounds_down() {
        // 30 fps * 1.0 s = 30 natural samples -> 16
        assert_eq!(frame_count_for(30.0, 1.0), 16);
        // Exactly a power of two stays put
        assert_eq!(frame_count_for(32.0, 1.0), 32);
        assert_eq!(frame_count_for(30.0, 0.01), 1);
    }

    #[test]
    fn table_has_vertex_count_times_frame_count_entries() {
        let baked = bake(&quad_mesh(), &single_joint_skeleton(), &static_clip(1.0, 30.0));
        assert_eq!(baked.frame_count, 16);
        assert_eq!(baked.vertex_count, 3);
        assert_eq!(baked.table.len(), 3 * 16);
    }

    #[test]
    fn short_clip_bakes_a_single_frame() {
        let baked = bake(&quad_mesh(), &single_joint_skeleton(), &static_clip(0.01, 30.0));
        assert_eq!(baked.frame_count, 1);
        assert_eq!(baked.table.len(), 3);
    }

    #[test]
    fn static_clip_bakes_bind_pose_every_frame() {
        let mesh = quad_mesh();
        let baked = bake(&mesh, &single_joint_skeleton(), &static_clip(1.0, 30.0));
        for (v, position) in mesh.positions.iter().enumerate() {
            for f in 0..baked.frame_count {
                let sampled = baked.sample(v as u32, f);
                assert!((sampled - *position).length() < 1e-5);
            }
        }
    }

    #[test]
    fn table_is_vertex_major() {
        let mesh = quad_mesh();
        let baked = bake(&mesh, &single_joint_skeleton(), &static_clip(1.0, 30.0));
        // All frames of vertex 1 occupy one contiguous run.
        let fc = baked.frame_count as usize;
        for f in 0..fc {
            let entry = baked.table[fc + f];
            assert!((entry[0] - 1.0).abs() < 1e-5);
            assert!((entry[3] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn rotating_clip_moves_vertices() {
        let clip = AnimationClip {
            length: 1.0,
            frame_rate: 30.0,
            channels: vec![JointChannel {
                joint: 0,
                rotations: vec![
                    (0.0, Quat::IDENTITY),
                    (1.0, Quat::from_rotation_z(FRAC_PI_2)),
                ],
                translations: vec![],
            }],
        };
        let baked = bake(&quad_mesh(), &single_joint_skeleton(), &clip);
        // Frame 0 is the bind pose; the last frame is visibly rotated.
        let start = baked.sample(1, 0);
        let end = baked.sample(1, baked.frame_count - 1);
        assert!((start - Vec3::X).length() < 1e-5);
        assert!((end - start).length() > 0.5);
    }

    #[test]
    fn keyframe_sampling_clamps_and_interpolates() {
        let keys = vec![(0.0, Vec3::ZERO), (1.0, Vec3::X)];
        let lerp = |a: Vec3, b: Vec3, t: f32| a.lerp(b, t);
        assert_eq!(sample_keys(&keys, -1.0, Vec3::ZERO, lerp), Vec3::ZERO);
        assert_eq!(sample_keys(&keys, 2.0, Vec3::ZERO, lerp), Vec3::X);
        let mid = sample_keys(&keys, 0.5, Vec3::ZERO, lerp);
        assert!((mid.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn child_joint_follows_parent() {
        // Two-bone chain: child sits one unit along X from the root.
        let skeleton = Skeleton {
            joints: vec![
                Joint {
                    parent: None,
                    inverse_bind: Mat4::IDENTITY,
                    rest_translation: Vec3::ZERO,
                    rest_rotation: Quat::IDENTITY,
                },
                Joint {
                    parent: Some(0),
                    inverse_bind: Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0)),
                    rest_translation: Vec3::X,
                    rest_rotation: Quat::IDENTITY,
                },
            ],
        };
        let clip = AnimationClip {
            length: 1.0,
            frame_rate: 2.0,
            channels: vec![JointChannel {
                joint: 0,
                rotations: vec![],
                translations: vec![(0.0, Vec3::ZERO), (1.0, Vec3::Y)],
            }],
        };
        let mesh = SkinnedMesh {
            positions: vec![Vec3::X],
            normals: vec![Vec3::Z],
            joints: vec![[1, 0, 0, 0]],
            weights: vec![[1.0, 0.0, 0.0, 0.0]],
            indices: vec![],
            submeshes: vec![],
        };
        let baked = bake(&mesh, &skeleton, &clip);
        assert_eq!(baked.frame_count, 2);
        // Root translation carries the child-skinned vertex with it.
        let moved = baked.sample(0, 1);
        assert!((moved - Vec3::new(1.0, 0.5, 0.0)).length() < 1e-5);
    }
}
