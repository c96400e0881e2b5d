use glam::Vec3;

use meshsync_shared::{Mesh, Transform};

/// Grid of `columns` x `rows` unit quads on the xy plane
pub fn quad_grid(path: &str, columns: i32, rows: i32) -> Mesh {
    let mut mesh = Mesh::new(path);
    for y in 0..=rows {
        for x in 0..=columns {
            mesh.points.push(Vec3::new(x as f32, y as f32, 0.0));
        }
    }
    let stride = columns + 1;
    for y in 0..rows {
        for x in 0..columns {
            let i = y * stride + x;
            mesh.indices.extend([i, i + 1, i + stride + 1, i + stride]);
            mesh.counts.push(4);
        }
    }
    mesh
}

pub fn transform_at(path: &str, position: Vec3) -> Transform {
    let mut transform = Transform::new(path);
    transform.position = position;
    transform
}

/// Triangles of a fan triangulation, as point positions rounded to integers
pub fn fan_triangles(points: &[Vec3], counts: &[i32], indices: &[i32]) -> Vec<[[i32; 3]; 3]> {
    let corner = |index: i32| {
        let p = points[index as usize];
        [p.x.round() as i32, p.y.round() as i32, p.z.round() as i32]
    };
    let mut triangles = Vec::new();
    let mut offset = 0;
    for &count in counts {
        let face = &indices[offset..offset + count as usize];
        for i in 1..face.len().saturating_sub(1) {
            triangles.push([corner(face[0]), corner(face[i]), corner(face[i + 1])]);
        }
        offset += count as usize;
    }
    triangles
}
