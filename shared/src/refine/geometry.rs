use glam::{Mat4, Vec3, Vec4};

use crate::{refine::error::RefineError, scene::Mesh};

const WELD_EPSILON: f32 = 1e-4;

fn reflect_point(p: Vec3, normal: Vec3, distance: f32) -> Vec3 {
    p - normal * (2.0 * (p.dot(normal) - distance))
}

fn reflect_vector(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * (2.0 * v.dot(normal))
}

fn reflect_tangent(t: Vec4, normal: Vec3) -> Vec4 {
    reflect_vector(t.truncate(), normal).extend(-t.w)
}

/// Copies `values[i]` for every `i` in `sources` onto the end of `values`.
fn append_mapped<T: Copy>(values: &mut Vec<T>, sources: &[usize], map: impl Fn(T) -> T) {
    values.reserve(sources.len());
    for &source in sources {
        let value = map(values[source]);
        values.push(value);
    }
}

impl Mesh {
    pub fn validate_topology(&self) -> Result<(), RefineError> {
        let mut counted = 0usize;
        for (face, &count) in self.counts.iter().enumerate() {
            if count < 0 {
                return Err(RefineError::NegativeCount { face });
            }
            counted += count as usize;
        }
        if counted != self.indices.len() {
            return Err(RefineError::CountMismatch {
                counted,
                indices: self.indices.len(),
            });
        }
        let point_count = self.points.len();
        if let Some((corner, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &index)| index < 0 || index as usize >= point_count)
        {
            return Err(RefineError::IndexOutOfRange {
                corner,
                index,
                point_count,
            });
        }
        Ok(())
    }

    pub fn flip_u(&mut self) {
        for uv in self.uv0.iter_mut() {
            uv.x = 1.0 - uv.x;
        }
    }

    pub fn flip_v(&mut self) {
        for uv in self.uv0.iter_mut() {
            uv.y = 1.0 - uv.y;
        }
    }

    /// Moves the vertex data through `matrix`. Identity is a no-op.
    pub fn apply_matrix(&mut self, matrix: &Mat4) {
        if matrix.abs_diff_eq(Mat4::IDENTITY, 1e-6) {
            return;
        }
        for p in self.points.iter_mut() {
            *p = matrix.transform_point3(*p);
        }
        for n in self.normals.iter_mut() {
            *n = matrix.transform_vector3(*n).normalize_or_zero();
        }
        for t in self.tangents.iter_mut() {
            *t = matrix
                .transform_vector3(t.truncate())
                .normalize_or_zero()
                .extend(t.w);
        }
        for v in self.velocities.iter_mut() {
            *v = matrix.transform_vector3(*v);
        }
    }

    /// Appends a mirrored copy across the plane `dot(p, normal) == distance`.
    /// With `weld`, points lying on the plane are shared by both halves
    /// instead of duplicated.
    pub fn apply_mirror(&mut self, normal: Vec3, distance: f32, weld: bool) {
        let point_count = self.points.len();
        let face_count = self.counts.len();
        let index_count = self.indices.len();

        // welding
        let mut indirect = Vec::with_capacity(point_count);
        let mut copies = Vec::new();
        for (i, p) in self.points.iter().enumerate() {
            if weld && (p.dot(normal) - distance).abs() <= WELD_EPSILON {
                indirect.push(i as i32);
            } else {
                indirect.push((point_count + copies.len()) as i32);
                copies.push(i);
            }
        }

        append_mapped(&mut self.points, &copies, |p| {
            reflect_point(p, normal, distance)
        });

        // mirrored faces wind the other way
        let mut mirrored_corners = Vec::with_capacity(index_count);
        let mut offset = 0usize;
        for face in 0..face_count {
            let count = self.counts[face] as usize;
            for corner in (offset..offset + count).rev() {
                mirrored_corners.push(corner);
                let index = self.indices[corner] as usize;
                self.indices.push(indirect[index]);
            }
            self.counts.push(count as i32);
            offset += count;
        }

        if self.material_ids.len() == face_count {
            self.material_ids.extend_from_within(..);
        }

        // per point
        if self.normals.len() == point_count {
            append_mapped(&mut self.normals, &copies, |n| reflect_vector(n, normal));
        }
        if self.tangents.len() == point_count {
            append_mapped(&mut self.tangents, &copies, |t| reflect_tangent(t, normal));
        }
        if self.uv0.len() == point_count {
            append_mapped(&mut self.uv0, &copies, |uv| uv);
        }
        if self.uv1.len() == point_count {
            append_mapped(&mut self.uv1, &copies, |uv| uv);
        }
        if self.colors.len() == point_count {
            append_mapped(&mut self.colors, &copies, |c| c);
        }
        if self.velocities.len() == point_count {
            append_mapped(&mut self.velocities, &copies, |v| reflect_vector(v, normal));
        }
        for bone in self.bones.iter_mut() {
            if bone.weights.len() == point_count {
                append_mapped(&mut bone.weights, &copies, |w| w);
            }
        }
        for frame in self.blendshapes.iter_mut().flat_map(|b| b.frames.iter_mut()) {
            if frame.points.len() == point_count {
                append_mapped(&mut frame.points, &copies, |d| reflect_vector(d, normal));
            }
            if frame.normals.len() == point_count {
                append_mapped(&mut frame.normals, &copies, |d| reflect_vector(d, normal));
            }
            if frame.tangents.len() == point_count {
                append_mapped(&mut frame.tangents, &copies, |d| reflect_vector(d, normal));
            }
        }

        // per corner
        if self.normals.len() == index_count {
            append_mapped(&mut self.normals, &mirrored_corners, |n| {
                reflect_vector(n, normal)
            });
        }
        if self.tangents.len() == index_count {
            append_mapped(&mut self.tangents, &mirrored_corners, |t| {
                reflect_tangent(t, normal)
            });
        }
        if self.uv0.len() == index_count {
            append_mapped(&mut self.uv0, &mirrored_corners, |uv| uv);
        }
        if self.uv1.len() == index_count {
            append_mapped(&mut self.uv1, &mirrored_corners, |uv| uv);
        }
        if self.colors.len() == index_count {
            append_mapped(&mut self.colors, &mirrored_corners, |c| c);
        }
    }

    /// Adds a reversed copy of every polygon. Normals and tangents become
    /// per-corner so the back faces can point the other way.
    pub fn make_double_sided(&mut self) {
        let point_count = self.points.len();
        let face_count = self.counts.len();
        let index_count = self.indices.len();

        if self.normals.len() == point_count && point_count != index_count {
            self.normals = self.indices.iter().map(|&i| self.normals[i as usize]).collect();
        }
        if self.tangents.len() == point_count && point_count != index_count {
            self.tangents = self.indices.iter().map(|&i| self.tangents[i as usize]).collect();
        }

        let mut back_corners = Vec::with_capacity(index_count);
        let mut back_faces = Vec::with_capacity(face_count);
        let mut offset = 0usize;
        for face in 0..face_count {
            let count = self.counts[face] as usize;
            if count >= 3 {
                back_faces.push(face);
                back_corners.extend((offset..offset + count).rev());
            }
            offset += count;
        }

        for &face in &back_faces {
            let count = self.counts[face];
            self.counts.push(count);
        }
        append_mapped(&mut self.indices, &back_corners, |i| i);

        if self.material_ids.len() == face_count {
            append_mapped(&mut self.material_ids, &back_faces, |m| m);
        }
        if self.normals.len() == index_count {
            append_mapped(&mut self.normals, &back_corners, |n| -n);
        }
        if self.tangents.len() == index_count {
            append_mapped(&mut self.tangents, &back_corners, |t| {
                (-t.truncate()).extend(t.w)
            });
        }
        if self.uv0.len() == index_count {
            append_mapped(&mut self.uv0, &back_corners, |uv| uv);
        }
        if self.uv1.len() == index_count {
            append_mapped(&mut self.uv1, &back_corners, |uv| uv);
        }
        if self.colors.len() == index_count {
            append_mapped(&mut self.colors, &back_corners, |c| c);
        }
    }

    /// Keeps the `max_influence` strongest bone weights of each point and
    /// renormalizes them to sum to one.
    pub fn cap_bone_influence(&mut self, max_influence: usize) {
        let point_count = self.points.len();
        if max_influence == 0 || self.bones.len() <= max_influence {
            return;
        }
        if self.bones.iter().any(|bone| bone.weights.len() != point_count) {
            log::warn!(
                "mesh {}: bone weights don't match the point count, influence not capped",
                self.transform.path
            );
            return;
        }

        let mut influences: Vec<(usize, f32)> = Vec::with_capacity(self.bones.len());
        for point in 0..point_count {
            influences.clear();
            influences.extend(
                self.bones
                    .iter()
                    .enumerate()
                    .map(|(bone, data)| (bone, data.weights[point]))
                    .filter(|(_, weight)| *weight > 0.0),
            );
            if influences.len() <= max_influence {
                continue;
            }
            influences.sort_by(|a, b| b.1.total_cmp(&a.1));

            let kept: f32 = influences[..max_influence].iter().map(|(_, w)| w).sum();
            for (rank, &(bone, weight)) in influences.iter().enumerate() {
                self.bones[bone].weights[point] = if rank < max_influence && kept > 0.0 {
                    weight / kept
                } else {
                    0.0
                };
            }
        }
    }
}
