use std::collections::HashMap;

use glam::Vec3;

use crate::{
    constants::INVALID_ID,
    scene::{SplitData, SubmeshData, Topology},
};

/// A per-corner attribute the refiner compares when welding corners into vertices
pub trait CornerAttribute {
    fn same(&self, a: usize, b: usize) -> bool;
}

impl<T: PartialEq> CornerAttribute for Vec<T> {
    fn same(&self, a: usize, b: usize) -> bool {
        self[a] == self[b]
    }
}

struct Face {
    corner_offset: usize,
    corner_count: usize,
    material_id: i32,
}

/// Re-indexes a polygon mesh into unique vertices, optionally triangulating,
/// and cuts the result into splits of at most `split_unit` vertices.
pub struct MeshRefiner<'a> {
    pub points: &'a [Vec3],
    pub counts: &'a [i32],
    pub indices: &'a [i32],
    /// Per face, may be empty
    pub material_ids: &'a [i32],
    pub corner_attributes: Vec<&'a dyn CornerAttribute>,
    /// 0 means unlimited
    pub split_unit: usize,
    pub triangulate: bool,
    pub flip_faces: bool,

    // Result
    /// Source point of each new vertex
    pub new2old_points: Vec<u32>,
    /// Source corner of each new vertex
    pub new2corner: Vec<u32>,
    pub new_counts: Vec<i32>,
    pub new_indices: Vec<i32>,
    pub new_material_ids: Vec<i32>,
    pub splits: Vec<SplitData>,
    pub submeshes: Vec<SubmeshData>,

    corners: Vec<u32>,
    faces: Vec<Face>,
    vertex_cache: HashMap<u32, Vec<u32>>,
}

impl<'a> MeshRefiner<'a> {
    pub fn new(points: &'a [Vec3], counts: &'a [i32], indices: &'a [i32]) -> Self {
        Self {
            points,
            counts,
            indices,
            material_ids: &[],
            corner_attributes: Vec::new(),
            split_unit: 0,
            triangulate: false,
            flip_faces: false,
            new2old_points: Vec::new(),
            new2corner: Vec::new(),
            new_counts: Vec::new(),
            new_indices: Vec::new(),
            new_material_ids: Vec::new(),
            splits: Vec::new(),
            submeshes: Vec::new(),
            corners: Vec::new(),
            faces: Vec::new(),
            vertex_cache: HashMap::new(),
        }
    }

    pub fn add_corner_attribute(&mut self, attribute: &'a dyn CornerAttribute) {
        self.corner_attributes.push(attribute);
    }

    pub fn refine(&mut self) {
        self.build_faces();
        if !self.material_ids.is_empty() {
            // stable, so the order within a material is kept
            self.faces.sort_by_key(|face| face.material_id);
        }
        self.emit_vertices();
    }

    // Faces

    fn build_faces(&mut self) {
        let has_materials = !self.material_ids.is_empty();
        let mut offset = 0usize;
        for (face_index, &count) in self.counts.iter().enumerate() {
            let count = count as usize;
            let material_id = if has_materials {
                self.material_ids
                    .get(face_index)
                    .copied()
                    .unwrap_or(INVALID_ID)
            } else {
                INVALID_ID
            };

            if self.triangulate {
                // fan: (0, i + 1, i + 2)
                for i in 0..count.saturating_sub(2) {
                    let (b, c) = if self.flip_faces {
                        (i + 2, i + 1)
                    } else {
                        (i + 1, i + 2)
                    };
                    self.push_face(&[offset, offset + b, offset + c], material_id);
                }
            } else if self.flip_faces && count >= 3 {
                let reversed: Vec<usize> = std::iter::once(offset)
                    .chain((1..count).rev().map(|i| offset + i))
                    .collect();
                self.push_face(&reversed, material_id);
            } else {
                let corners: Vec<usize> = (offset..offset + count).collect();
                self.push_face(&corners, material_id);
            }
            offset += count;
        }
    }

    fn push_face(&mut self, corners: &[usize], material_id: i32) {
        self.faces.push(Face {
            corner_offset: self.corners.len(),
            corner_count: corners.len(),
            material_id,
        });
        self.corners.extend(corners.iter().map(|&c| c as u32));
    }

    // Vertices

    fn same_attributes(&self, a: usize, b: usize) -> bool {
        self.corner_attributes.iter().all(|attr| attr.same(a, b))
    }

    fn find_vertex(&self, corner: u32) -> Option<u32> {
        let point = self.indices[corner as usize] as u32;
        self.vertex_cache.get(&point).and_then(|candidates| {
            candidates.iter().copied().find(|&vertex| {
                self.same_attributes(self.new2corner[vertex as usize] as usize, corner as usize)
            })
        })
    }

    fn find_or_emit_vertex(&mut self, corner: u32) -> u32 {
        if let Some(vertex) = self.find_vertex(corner) {
            return vertex;
        }
        let point = self.indices[corner as usize] as u32;
        let vertex = self.new2old_points.len() as u32;
        self.new2old_points.push(point);
        self.new2corner.push(corner);
        self.vertex_cache.entry(point).or_default().push(vertex);
        vertex
    }

    /// Vertices a face would add to the current split
    fn count_new_vertices(&self, corners: &[u32]) -> usize {
        corners
            .iter()
            .enumerate()
            .filter(|&(i, &corner)| {
                self.find_vertex(corner).is_none()
                    && !corners[..i].iter().any(|&earlier| {
                        self.indices[earlier as usize] == self.indices[corner as usize]
                            && self.same_attributes(earlier as usize, corner as usize)
                    })
            })
            .count()
    }

    fn emit_vertices(&mut self) {
        let faces = std::mem::take(&mut self.faces);
        let corners = std::mem::take(&mut self.corners);
        let has_materials = !self.material_ids.is_empty();

        let mut split_face_start = 0usize;
        let mut split_vertex_start = 0usize;
        let mut split_index_start = 0usize;

        for (face_index, face) in faces.iter().enumerate() {
            let face_corners = &corners[face.corner_offset..face.corner_offset + face.corner_count];

            if self.split_unit > 0 {
                let split_vertices = self.new2old_points.len() - split_vertex_start;
                if split_vertices > 0
                    && split_vertices + self.count_new_vertices(face_corners) > self.split_unit
                {
                    self.close_split(
                        &faces[split_face_start..face_index],
                        split_vertex_start,
                        split_index_start,
                    );
                    split_face_start = face_index;
                    split_vertex_start = self.new2old_points.len();
                    split_index_start = self.new_indices.len();
                    self.vertex_cache.clear();
                }
            }

            for &corner in face_corners {
                let vertex = self.find_or_emit_vertex(corner);
                self.new_indices.push(vertex as i32);
            }
            self.new_counts.push(face.corner_count as i32);
            if has_materials {
                self.new_material_ids.push(face.material_id);
            }
        }

        if split_face_start < faces.len() {
            self.close_split(
                &faces[split_face_start..],
                split_vertex_start,
                split_index_start,
            );
        }
        self.vertex_cache.clear();
    }

    fn close_split(&mut self, faces: &[Face], vertex_start: usize, index_start: usize) {
        let split_index = self.splits.len() as i32;
        let submesh_offset = self.submeshes.len();

        // one submesh per run of equal material
        let mut index_offset = index_start;
        let mut run_start = 0usize;
        while run_start < faces.len() {
            let material_id = faces[run_start].material_id;
            let run_end = faces[run_start..]
                .iter()
                .position(|face| face.material_id != material_id)
                .map_or(faces.len(), |p| run_start + p);
            let run = &faces[run_start..run_end];
            let index_count: usize = run.iter().map(|face| face.corner_count).sum();

            let first_size = run[0].corner_count as i32;
            let topology = if run.iter().all(|f| f.corner_count as i32 == first_size) {
                Topology::from_face_size(first_size)
            } else {
                None
            };
            match topology {
                Some(topology) => self.submeshes.push(SubmeshData {
                    index_offset: index_offset as i32,
                    index_count: index_count as i32,
                    topology,
                    material_id,
                    split_index,
                }),
                None => log::trace!(
                    "mixed polygon sizes in split {}, no submesh emitted for material {}",
                    split_index,
                    material_id
                ),
            }

            index_offset += index_count;
            run_start = run_end;
        }

        self.splits.push(SplitData {
            vertex_offset: vertex_start as i32,
            vertex_count: (self.new2old_points.len() - vertex_start) as i32,
            index_offset: index_start as i32,
            index_count: (self.new_indices.len() - index_start) as i32,
            submesh_offset: submesh_offset as i32,
            submesh_count: (self.submeshes.len() - submesh_offset) as i32,
        });
    }
}
