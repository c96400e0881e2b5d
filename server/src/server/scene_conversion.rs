use std::sync::Arc;

use rayon::prelude::*;

use meshsync_shared::{
    AxisConversion, GetMessage, Handedness, MeshRefineFlags, MeshRefineSettings, Scene,
};

/// Usable scale, falling back to 1 for zero, negative or non-finite factors.
fn sanitize_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Folds an axis conversion and a scale into a mesh's refine settings.
/// Mirroring conversions reverse the winding, which FLIP_FACES undoes.
fn with_conversion(
    base: &MeshRefineSettings,
    conversion: AxisConversion,
    scale: f32,
) -> MeshRefineSettings {
    let mut settings = base.clone();
    settings.flags.set(MeshRefineFlags::SWAP_HANDEDNESS, conversion.flip_x);
    settings.flags.set(MeshRefineFlags::SWAP_YZ, conversion.swap_yz);
    if conversion.reverses_winding() {
        settings.flags.toggle(MeshRefineFlags::FLIP_FACES);
    }
    settings.scale_factor = scale;
    settings
}

fn convert_scene(
    scene: &mut Scene,
    conversion: AxisConversion,
    scale: f32,
    mesh_settings: impl Fn(&MeshRefineSettings) -> MeshRefineSettings + Sync,
) {
    scene.entities.par_iter_mut().for_each(|entity| {
        let entity = Arc::make_mut(entity);
        match entity.as_mesh_mut() {
            Some(mesh) => {
                let base = mesh_settings(&mesh.refine_settings);
                let settings = with_conversion(&base, conversion, scale);
                if let Err(error) = mesh.refine(&settings) {
                    log::warn!("mesh {} was not refined: {}", mesh.transform.path, error);
                }
            }
            None => {
                entity.convert_axes(conversion);
                if scale != 1.0 {
                    entity.apply_scale_factor(scale);
                }
            }
        }
    });

    for asset in scene.assets.iter_mut() {
        let asset = Arc::make_mut(asset);
        asset.convert_axes(conversion);
        if scale != 1.0 {
            asset.apply_scale_factor(scale);
        }
    }
}

/// Brings a received scene into the engine convention: left-handed, Y-up and
/// engine units. Meshes are split with the server's limits.
pub(crate) fn import_scene(scene: &mut Scene, split_unit: i32, max_bone_influence: i32) {
    let conversion = scene.settings.handedness.conversion();
    let scale = 1.0 / sanitize_scale(scene.settings.scale_factor);

    convert_scene(scene, conversion, scale, |own| {
        let mut settings = own.clone();
        settings.flags.insert(MeshRefineFlags::SPLIT);
        settings.split_unit = split_unit;
        settings.max_bone_influence = max_bone_influence;
        settings
    });

    scene.settings.handedness = Handedness::Left;
    scene.settings.scale_factor = 1.0;
}

/// Converts a host scene into the convention a Get asked for and refines its
/// meshes with the requested flags.
pub(crate) fn export_scene(scene: &mut Scene, request: &GetMessage) {
    let conversion = request.scene_settings.handedness.conversion();
    let scale = sanitize_scale(request.scene_settings.scale_factor);

    convert_scene(scene, conversion, scale, |_| {
        let mut settings = request.refine_settings.clone();
        settings.smooth_angle = 180.0;
        settings.max_bone_influence = 0;
        settings
    });

    scene.settings = request.scene_settings.clone();
}
