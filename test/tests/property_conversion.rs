/// PROPERTY-BASED TESTS: conversion and refinement invariants
///
/// 1. Axis conversions are self-inverse
/// 2. Converting a rotated point equals rotating the converted point
/// 3. Refining an already refined mesh with the same settings changes nothing
use glam::{Quat, Vec3};
use proptest::prelude::*;

use meshsync_shared::{AxisConversion, MeshRefineFlags, MeshRefineSettings, Transform};
use meshsync_test::quad_grid;

fn vec3_strategy() -> impl Strategy<Value = Vec3> {
    (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn rotation_strategy() -> impl Strategy<Value = Quat> {
    (vec3_strategy(), -3.0f32..3.0).prop_map(|(axis, angle)| {
        let axis = axis.try_normalize().unwrap_or(Vec3::Y);
        Quat::from_axis_angle(axis, angle)
    })
}

fn conversion_strategy() -> impl Strategy<Value = AxisConversion> {
    (any::<bool>(), any::<bool>()).prop_map(|(flip_x, swap_yz)| AxisConversion { flip_x, swap_yz })
}

proptest! {
    #[test]
    fn prop_conversion_is_self_inverse(
        position in vec3_strategy(),
        rotation in rotation_strategy(),
        scale in vec3_strategy(),
        conversion in conversion_strategy(),
    ) {
        let mut transform = Transform::new("/node");
        transform.position = position;
        transform.rotation = rotation;
        transform.scale = scale;
        let original = transform.clone();

        transform.convert_axes(conversion);
        transform.convert_axes(conversion);
        prop_assert_eq!(transform, original);
    }

    #[test]
    fn prop_conversion_preserves_rotation(
        point in vec3_strategy(),
        rotation in rotation_strategy(),
        conversion in conversion_strategy(),
    ) {
        let rotated_then_converted = conversion.vec3(rotation * point);
        let converted_then_rotated = conversion.quat(rotation) * conversion.vec3(point);
        prop_assert!(
            (rotated_then_converted - converted_then_rotated).length() < 1e-2,
            "{} vs {}",
            rotated_then_converted,
            converted_then_rotated
        );
    }

    #[test]
    fn prop_scale_factor_round_trips(position in vec3_strategy(), factor in 0.01f32..100.0) {
        let mut transform = Transform::new("/node");
        transform.position = position;
        transform.apply_scale_factor(factor);
        transform.apply_scale_factor(1.0 / factor);
        prop_assert!((transform.position - position).length() < 1e-3);
    }

    #[test]
    fn prop_refine_is_idempotent(
        columns in 1i32..6,
        rows in 1i32..6,
        split_unit in 3i32..40,
        swap_handedness in any::<bool>(),
        flip_faces in any::<bool>(),
        flip_normals in any::<bool>(),
        gen_normals in any::<bool>(),
    ) {
        let mut flags = MeshRefineFlags::TRIANGULATE | MeshRefineFlags::SPLIT;
        flags.set(MeshRefineFlags::SWAP_HANDEDNESS, swap_handedness);
        flags.set(MeshRefineFlags::FLIP_FACES, flip_faces);
        flags.set(MeshRefineFlags::FLIP_NORMALS, flip_normals);
        flags.set(MeshRefineFlags::GEN_NORMALS, gen_normals);
        let settings = MeshRefineSettings {
            flags,
            split_unit,
            ..MeshRefineSettings::default()
        };

        let mut mesh = quad_grid("/grid", columns, rows);
        if !gen_normals {
            mesh.normals = vec![Vec3::Z; mesh.points.len()];
        }
        mesh.refine(&settings).unwrap();
        let once = mesh.clone();
        mesh.refine(&settings.without_conversions()).unwrap();

        prop_assert_eq!(&mesh.points, &once.points);
        prop_assert_eq!(&mesh.counts, &once.counts);
        prop_assert_eq!(&mesh.indices, &once.indices);
        prop_assert_eq!(&mesh.normals, &once.normals);
        prop_assert_eq!(&mesh.splits, &once.splits);
        prop_assert!(mesh.splits.iter().all(|split| split.vertex_count <= split_unit));
    }
}
