use glam::Vec3;

use crate::{
    refine::{
        error::RefineError,
        normals::{generate_normals_poly, generate_normals_with_smooth_angle, generate_tangents},
        refiner::MeshRefiner,
        settings::{MeshRefineFlags, MeshRefineSettings},
    },
    scene::{AxisConversion, Bounds, Mesh},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    PerPoint,
    PerCorner,
}

fn layout_of(
    path: &str,
    name: &str,
    len: usize,
    point_count: usize,
    index_count: usize,
) -> Option<Layout> {
    if len == 0 {
        None
    } else if len == point_count {
        Some(Layout::PerPoint)
    } else if len == index_count {
        Some(Layout::PerCorner)
    } else {
        log::warn!(
            "mesh {}: {} has {} elements, expected {} or {}. discarded",
            path,
            name,
            len,
            point_count,
            index_count
        );
        None
    }
}

fn remap<T: Copy>(values: &[T], map: &[u32]) -> Vec<T> {
    map.iter().map(|&i| values[i as usize]).collect()
}

/// Resolves an attribute's cardinality, clearing it when it fits neither
/// the points nor the corners.
fn resolve<T>(
    values: &mut Vec<T>,
    path: &str,
    name: &str,
    point_count: usize,
    index_count: usize,
) -> Option<Layout> {
    let layout = layout_of(path, name, values.len(), point_count, index_count);
    if layout.is_none() {
        values.clear();
    }
    layout
}

fn remap_by_layout<T: Copy>(
    values: &mut Vec<T>,
    layout: Option<Layout>,
    new2old_points: &[u32],
    new2corner: &[u32],
) {
    match layout {
        Some(Layout::PerPoint) => *values = remap(values, new2old_points),
        Some(Layout::PerCorner) => *values = remap(values, new2corner),
        None => {}
    }
}

impl Mesh {
    /// Runs the refinement pass described by `settings`. The mesh is left
    /// untouched when its topology is inconsistent.
    pub fn refine(&mut self, settings: &MeshRefineSettings) -> Result<(), RefineError> {
        self.validate_topology()?;
        let flags = settings.flags;

        if flags.contains(MeshRefineFlags::FLIP_U) {
            self.flip_u();
        }
        if flags.contains(MeshRefineFlags::FLIP_V) {
            self.flip_v();
        }

        if flags.contains(MeshRefineFlags::APPLY_LOCAL2WORLD) {
            self.apply_matrix(&settings.local2world);
        }

        for (flag, weld, normal) in [
            (MeshRefineFlags::MIRROR_X, MeshRefineFlags::MIRROR_X_WELD, Vec3::X),
            (MeshRefineFlags::MIRROR_Y, MeshRefineFlags::MIRROR_Y_WELD, Vec3::Y),
            (MeshRefineFlags::MIRROR_Z, MeshRefineFlags::MIRROR_Z_WELD, Vec3::Z),
        ] {
            if flags.contains(flag) {
                self.apply_mirror(normal, 0.0, flags.contains(weld));
            }
        }

        if settings.scale_factor != 1.0 {
            self.apply_scale_factor(settings.scale_factor);
        }

        self.convert_axes(AxisConversion {
            flip_x: flags.contains(MeshRefineFlags::SWAP_HANDEDNESS),
            swap_yz: flags.contains(MeshRefineFlags::SWAP_YZ),
        });

        if flags.contains(MeshRefineFlags::APPLY_WORLD2LOCAL) {
            self.apply_matrix(&settings.world2local);
        }

        if settings.max_bone_influence > 0 {
            self.cap_bone_influence(settings.max_bone_influence as usize);
        }

        let flip_faces = flags.contains(MeshRefineFlags::FLIP_FACES);
        let flip_normals = flags.contains(MeshRefineFlags::FLIP_NORMALS) ^ flip_faces;
        let mut normals_per_corner = false;
        let smooth = flags.contains(MeshRefineFlags::GEN_NORMALS_WITH_SMOOTH_ANGLE);
        if flags.contains(MeshRefineFlags::GEN_NORMALS) || (smooth && settings.smooth_angle >= 180.0)
        {
            self.normals =
                generate_normals_poly(&self.points, &self.counts, &self.indices, flip_normals);
        } else if smooth {
            self.normals = generate_normals_with_smooth_angle(
                &self.points,
                &self.counts,
                &self.indices,
                settings.smooth_angle,
                flip_normals,
            );
            normals_per_corner = true;
        } else if flags.contains(MeshRefineFlags::FLIP_NORMALS) {
            for n in self.normals.iter_mut() {
                *n = -*n;
            }
        }

        if flags.contains(MeshRefineFlags::MAKE_DOUBLE_SIDED) {
            // back faces need their own normals, so they become per corner
            let corner_normals = normals_per_corner || !self.normals.is_empty();
            self.make_double_sided();
            normals_per_corner = corner_normals && self.normals.len() == self.indices.len();
        }

        self.refine_topology(settings, normals_per_corner);

        if flags.contains(MeshRefineFlags::GEN_TANGENTS) {
            self.generate_tangents();
        }

        self.bounds = Bounds::from_points(&self.points);
        self.setup_data_flags();
        Ok(())
    }

    fn refine_topology(&mut self, settings: &MeshRefineSettings, normals_per_corner: bool) {
        let flags = settings.flags;
        let point_count = self.points.len();
        let index_count = self.indices.len();
        let path = self.transform.path.clone();

        let normals_layout = if normals_per_corner {
            Some(Layout::PerCorner)
        } else {
            resolve(&mut self.normals, &path, "normals", point_count, index_count)
        };
        let tangents_layout = resolve(&mut self.tangents, &path, "tangents", point_count, index_count);
        let uv0_layout = resolve(&mut self.uv0, &path, "uv0", point_count, index_count);
        let uv1_layout = resolve(&mut self.uv1, &path, "uv1", point_count, index_count);
        let colors_layout = resolve(&mut self.colors, &path, "colors", point_count, index_count);
        if !self.velocities.is_empty() && self.velocities.len() != point_count {
            log::warn!("mesh {}: velocities don't match the point count. discarded", path);
            self.velocities.clear();
        }
        if !self.material_ids.is_empty() && self.material_ids.len() != self.counts.len() {
            log::warn!("mesh {}: material ids don't match the face count. discarded", path);
            self.material_ids.clear();
        }

        let has_corner_attribute = [normals_layout, tangents_layout, uv0_layout, uv1_layout, colors_layout]
            .contains(&Some(Layout::PerCorner));
        let needs_topology = flags.intersects(
            MeshRefineFlags::TRIANGULATE | MeshRefineFlags::SPLIT | MeshRefineFlags::FLIP_FACES,
        ) || has_corner_attribute;
        if !needs_topology {
            self.splits.clear();
            self.submeshes.clear();
            return;
        }

        let split_unit = if flags.contains(MeshRefineFlags::SPLIT) {
            settings.split_unit.max(0) as usize
        } else {
            0
        };

        let (new2old_points, new2corner, counts, indices, material_ids, splits, submeshes) = {
            let mut refiner = MeshRefiner::new(&self.points, &self.counts, &self.indices);
            refiner.material_ids = self.material_ids.as_slice();
            refiner.split_unit = split_unit;
            refiner.triangulate = flags.contains(MeshRefineFlags::TRIANGULATE);
            refiner.flip_faces = flags.contains(MeshRefineFlags::FLIP_FACES);
            if normals_layout == Some(Layout::PerCorner) {
                refiner.add_corner_attribute(&self.normals);
            }
            if tangents_layout == Some(Layout::PerCorner) {
                refiner.add_corner_attribute(&self.tangents);
            }
            if uv0_layout == Some(Layout::PerCorner) {
                refiner.add_corner_attribute(&self.uv0);
            }
            if uv1_layout == Some(Layout::PerCorner) {
                refiner.add_corner_attribute(&self.uv1);
            }
            if colors_layout == Some(Layout::PerCorner) {
                refiner.add_corner_attribute(&self.colors);
            }
            refiner.refine();
            (
                refiner.new2old_points,
                refiner.new2corner,
                refiner.new_counts,
                refiner.new_indices,
                refiner.new_material_ids,
                refiner.splits,
                refiner.submeshes,
            )
        };

        remap_by_layout(&mut self.normals, normals_layout, &new2old_points, &new2corner);
        remap_by_layout(&mut self.tangents, tangents_layout, &new2old_points, &new2corner);
        remap_by_layout(&mut self.uv0, uv0_layout, &new2old_points, &new2corner);
        remap_by_layout(&mut self.uv1, uv1_layout, &new2old_points, &new2corner);
        remap_by_layout(&mut self.colors, colors_layout, &new2old_points, &new2corner);
        if !self.velocities.is_empty() {
            self.velocities = remap(&self.velocities, &new2old_points);
        }

        for bone in self.bones.iter_mut() {
            if bone.weights.len() == point_count {
                bone.weights = remap(&bone.weights, &new2old_points);
            } else {
                bone.weights.clear();
            }
        }
        for frame in self.blendshapes.iter_mut().flat_map(|b| b.frames.iter_mut()) {
            for deltas in [&mut frame.points, &mut frame.normals, &mut frame.tangents] {
                let layout = layout_of(&path, "blendshape", deltas.len(), point_count, index_count);
                remap_by_layout(deltas, layout, &new2old_points, &new2corner);
                if layout.is_none() {
                    deltas.clear();
                }
            }
        }

        self.points = remap(&self.points, &new2old_points);
        self.counts = counts;
        self.indices = indices;
        if !self.material_ids.is_empty() {
            self.material_ids = material_ids;
        }
        self.splits = splits;
        self.submeshes = submeshes;
    }

    fn generate_tangents(&mut self) {
        if self.uv0.len() != self.points.len() {
            log::warn!(
                "mesh {}: tangents need per-point uv0, skipped",
                self.transform.path
            );
            return;
        }
        let normals = if self.normals.len() == self.points.len() {
            std::borrow::Cow::Borrowed(&self.normals)
        } else {
            std::borrow::Cow::Owned(generate_normals_poly(
                &self.points,
                &self.counts,
                &self.indices,
                false,
            ))
        };
        let tangents = generate_tangents(
            &self.points,
            &self.uv0,
            &normals,
            &self.counts,
            &self.indices,
        );
        self.tangents = tangents;
    }
}
