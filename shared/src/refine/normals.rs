use glam::{Vec2, Vec3, Vec4};

/// Area-weighted polygon normal (Newell's method), not normalized.
pub fn face_normal(points: &[Vec3], face: &[i32]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, &index) in face.iter().enumerate() {
        let current = points[index as usize];
        let next = points[face[(i + 1) % face.len()] as usize];
        normal += current.cross(next);
    }
    normal * 0.5
}

fn face_ranges(counts: &[i32]) -> impl Iterator<Item = std::ops::Range<usize>> + '_ {
    counts.iter().scan(0usize, |offset, &count| {
        let start = *offset;
        *offset += count as usize;
        Some(start..*offset)
    })
}

/// One normal per point, averaged over every face using the point.
pub fn generate_normals_poly(
    points: &[Vec3],
    counts: &[i32],
    indices: &[i32],
    flip: bool,
) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; points.len()];
    for range in face_ranges(counts) {
        let face = &indices[range];
        if face.len() < 3 {
            continue;
        }
        let normal = face_normal(points, face);
        for &index in face {
            normals[index as usize] += normal;
        }
    }
    let sign = if flip { -1.0 } else { 1.0 };
    for normal in normals.iter_mut() {
        *normal = normal.normalize_or_zero() * sign;
    }
    normals
}

/// One normal per face corner. Neighbouring faces are only blended in when
/// the angle between face normals is within `smooth_angle` degrees.
pub fn generate_normals_with_smooth_angle(
    points: &[Vec3],
    counts: &[i32],
    indices: &[i32],
    smooth_angle: f32,
    flip: bool,
) -> Vec<Vec3> {
    let ranges: Vec<_> = face_ranges(counts).collect();
    let face_normals: Vec<Vec3> = ranges
        .iter()
        .map(|range| {
            let face = &indices[range.clone()];
            if face.len() < 3 {
                Vec3::ZERO
            } else {
                face_normal(points, face)
            }
        })
        .collect();

    // point -> faces using it
    let mut point_faces: Vec<Vec<u32>> = vec![Vec::new(); points.len()];
    for (face_index, range) in ranges.iter().enumerate() {
        for &index in &indices[range.clone()] {
            point_faces[index as usize].push(face_index as u32);
        }
    }

    let threshold = smooth_angle.to_radians().cos();
    let sign = if flip { -1.0 } else { 1.0 };
    let mut normals = vec![Vec3::ZERO; indices.len()];
    for (face_index, range) in ranges.iter().enumerate() {
        let own = face_normals[face_index];
        let own_unit = own.normalize_or_zero();
        for corner in range.clone() {
            let mut normal = own;
            for &other in &point_faces[indices[corner] as usize] {
                let other = other as usize;
                if other == face_index {
                    continue;
                }
                let other_normal = face_normals[other];
                if own_unit.dot(other_normal.normalize_or_zero()) >= threshold {
                    normal += other_normal;
                }
            }
            normals[corner] = normal.normalize_or_zero() * sign;
        }
    }
    normals
}

/// Per-point tangents from position and uv derivatives. `w` carries the
/// bitangent sign. Polygons are fanned into triangles on the fly.
pub fn generate_tangents(
    points: &[Vec3],
    uv: &[Vec2],
    normals: &[Vec3],
    counts: &[i32],
    indices: &[i32],
) -> Vec<Vec4> {
    let mut tangents = vec![Vec3::ZERO; points.len()];
    let mut bitangents = vec![Vec3::ZERO; points.len()];

    for range in face_ranges(counts) {
        let face = &indices[range];
        for i in 1..face.len().saturating_sub(1) {
            let corners = [face[0] as usize, face[i] as usize, face[i + 1] as usize];
            let [a, b, c] = corners;
            let edge1 = points[b] - points[a];
            let edge2 = points[c] - points[a];
            let duv1 = uv[b] - uv[a];
            let duv2 = uv[c] - uv[a];

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
            let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * r;
            for corner in corners {
                tangents[corner] += tangent;
                bitangents[corner] += bitangent;
            }
        }
    }

    tangents
        .iter()
        .zip(bitangents.iter())
        .zip(normals.iter())
        .map(|((&t, &b), &n)| {
            // Gram-Schmidt against the normal
            let t = (t - n * n.dot(t)).normalize_or_zero();
            let w = if n.cross(t).dot(b) < 0.0 { -1.0 } else { 1.0 };
            t.extend(w)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<Vec3>, Vec<i32>, Vec<i32>) {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        (points, vec![4], vec![0, 1, 2, 3])
    }

    #[test]
    fn face_normal_follows_winding() {
        let (points, _, indices) = quad();
        assert!(face_normal(&points, &indices).abs_diff_eq(Vec3::Z, 1e-6));

        let reversed: Vec<i32> = indices.iter().rev().copied().collect();
        assert!(face_normal(&points, &reversed).abs_diff_eq(-Vec3::Z, 1e-6));
    }

    #[test]
    fn poly_normals_flip() {
        let (points, counts, indices) = quad();
        let normals = generate_normals_poly(&points, &counts, &indices, true);
        assert!(normals.iter().all(|n| n.abs_diff_eq(-Vec3::Z, 1e-6)));
    }

    #[test]
    fn hard_edge_is_kept_below_threshold() {
        // two quads folded 90 degrees along the x = 1 edge
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
        ];
        let counts = vec![4, 4];
        let indices = vec![0, 1, 2, 3, 1, 4, 5, 2];

        let sharp = generate_normals_with_smooth_angle(&points, &counts, &indices, 30.0, false);
        assert!(sharp[1].abs_diff_eq(Vec3::Z, 1e-6));
        assert!(sharp[4].abs_diff_eq(Vec3::X, 1e-6));

        let smooth = generate_normals_with_smooth_angle(&points, &counts, &indices, 120.0, false);
        let expected = (Vec3::Z + Vec3::X).normalize();
        assert!(smooth[1].abs_diff_eq(expected, 1e-6));
        assert!(smooth[4].abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn tangents_follow_u_direction() {
        let (points, counts, indices) = quad();
        let uv = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let normals = vec![Vec3::Z; 4];
        let tangents = generate_tangents(&points, &uv, &normals, &counts, &indices);
        for tangent in tangents {
            assert!(tangent.abs_diff_eq(Vec4::new(1.0, 0.0, 0.0, 1.0), 1e-6));
        }
    }
}
