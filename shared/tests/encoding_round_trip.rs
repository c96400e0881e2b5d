use std::fmt::Debug;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use meshsync_shared::{
    AnimationClip, Asset, Audio, AudioFormat, BlendShapeData, BlendShapeFrame, BoneData, Bounds,
    ByteReader, ByteWriter, Camera, Entity, FileAsset, GetFlags, GetMessage, Handedness, Key,
    Light, LightType, Material, Mesh, MeshRefineFlags, Message, MessageBody, Points, PollMessage,
    PollType, PropertyValue, QueryMessage, QueryType, Scene, ScreenshotMessage, Serde,
    SetMessage, ShadowType, SplitData, SubmeshData, TextMessage, TextType, Texture,
    TextureFormat, TextureType, Topology, TransformAnimation,
};

/// Encodes `value`, checks the predicted length and decodes it back.
fn round_trip<T: Serde + Debug>(value: &T) -> T {
    let mut writer = ByteWriter::new();
    value.ser(&mut writer);
    let bytes = writer.to_bytes();
    assert_eq!(bytes.len(), value.byte_length(), "byte_length of {:?}", value);

    let mut reader = ByteReader::new(&bytes);
    let decoded = T::de(&mut reader).unwrap();
    assert_eq!(reader.remaining(), 0);
    decoded
}

fn message_round_trip<M>(message: M)
where
    M: MessageBody + Serde + Clone + Debug + Into<Message>,
{
    let bytes = message.encode();
    assert_eq!(bytes.len(), message.byte_length());
    let decoded = Message::decode(M::KIND, &bytes).unwrap();
    assert_eq!(decoded, message.into());
}

fn textured_quad() -> Mesh {
    let mut mesh = Mesh::new("/root/body");
    mesh.transform.position = Vec3::new(0.5, 1.0, -2.0);
    mesh.transform.rotation = Quat::from_rotation_y(0.75);
    mesh.points = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
    mesh.normals = vec![Vec3::Z; 4];
    mesh.tangents = vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 4];
    mesh.uv0 = vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
    mesh.colors = vec![Vec4::ONE; 4];
    mesh.velocities = vec![Vec3::new(0.0, 0.1, 0.0); 4];
    mesh.counts = vec![3, 3];
    mesh.indices = vec![0, 1, 2, 0, 2, 3];
    mesh.material_ids = vec![0, 1];

    mesh.refine_settings.flags = MeshRefineFlags::SPLIT
        | MeshRefineFlags::GEN_NORMALS_WITH_SMOOTH_ANGLE
        | MeshRefineFlags::APPLY_LOCAL2WORLD;
    mesh.refine_settings.split_unit = 1024;
    mesh.refine_settings.smooth_angle = 45.0;
    mesh.refine_settings.local2world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    mesh.root_bone = String::from("/root/armature/hips");
    let mut bone = BoneData::new("/root/armature/hips");
    bone.bindpose = Mat4::from_scale(Vec3::splat(2.0));
    bone.weights = vec![1.0, 0.5, 0.25, 0.0];
    mesh.bones.push(bone);

    mesh.blendshapes.push(BlendShapeData {
        name: String::from("smile"),
        weight: 0.3,
        frames: vec![
            BlendShapeFrame {
                weight: 50.0,
                points: vec![Vec3::new(0.0, 0.01, 0.0); 4],
                normals: Vec::new(),
                tangents: Vec::new(),
            },
            BlendShapeFrame {
                weight: 100.0,
                points: vec![Vec3::new(0.0, 0.02, 0.0); 4],
                normals: vec![Vec3::Z; 4],
                tangents: vec![Vec3::X; 4],
            },
        ],
    });

    mesh.submeshes = vec![
        SubmeshData {
            index_offset: 0,
            index_count: 3,
            topology: Topology::Triangles,
            material_id: 0,
            split_index: 0,
        },
        SubmeshData {
            index_offset: 3,
            index_count: 3,
            topology: Topology::Triangles,
            material_id: 1,
            split_index: 0,
        },
    ];
    mesh.splits = vec![SplitData {
        vertex_offset: 0,
        vertex_count: 4,
        index_offset: 0,
        index_count: 6,
        submesh_offset: 0,
        submesh_count: 2,
    }];
    mesh.bounds = Bounds::from_points(&mesh.points);
    mesh.setup_data_flags();
    mesh
}

// ============================================================================
// Entities
// ============================================================================

#[test]
fn test_camera_round_trips() {
    let mut camera = Camera::new("/root/camera");
    camera.transform.position = Vec3::new(0.0, 1.6, -5.0);
    camera.is_ortho = true;
    camera.fov = 45.0;
    camera.near_plane = 0.1;
    camera.far_plane = 500.0;
    camera.focal_length = 35.0;
    camera.sensor_size = Vec2::new(36.0, 24.0);
    camera.lens_shift = Vec2::new(0.1, -0.1);
    camera.layer_mask = 0b1011;

    assert_eq!(round_trip(&camera), camera);
    let entity = Entity::from(camera);
    assert_eq!(round_trip(&entity), entity);
}

#[test]
fn test_light_round_trips() {
    let mut light = Light::new("/root/sun", LightType::Spot);
    light.shadow_type = ShadowType::Soft;
    light.color = Vec4::new(1.0, 0.9, 0.8, 1.0);
    light.intensity = 2.5;
    light.range = 30.0;
    light.spot_angle = 60.0;
    light.layer_mask = -1;

    assert_eq!(round_trip(&light), light);
    let entity = Entity::from(light);
    assert_eq!(round_trip(&entity), entity);
}

#[test]
fn test_points_round_trip() {
    let mut points = Points::new("/root/cloud");
    points.points = vec![Vec3::ZERO, Vec3::ONE, Vec3::NEG_ONE];
    points.rotations = vec![Quat::IDENTITY, Quat::from_rotation_x(1.0), Quat::IDENTITY];
    points.scales = vec![Vec3::ONE; 3];
    points.colors = vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 3];
    points.velocities = vec![Vec3::Y; 3];
    points.ids = vec![10, 11, 12];

    assert_eq!(round_trip(&points), points);
    let entity = Entity::from(points);
    assert_eq!(round_trip(&entity), entity);
}

#[test]
fn test_mesh_with_skinning_round_trips() {
    let mesh = textured_quad();
    assert!(mesh.flags.contains(meshsync_shared::MeshDataFlags::BLENDSHAPES));

    let decoded = round_trip(&mesh);
    assert_eq!(decoded.bones, mesh.bones);
    assert_eq!(decoded.blendshapes, mesh.blendshapes);
    assert_eq!(decoded.submeshes, mesh.submeshes);
    assert_eq!(decoded, mesh);

    let entity = Entity::from(mesh);
    assert_eq!(round_trip(&entity), entity);
}

#[test]
fn test_unchanged_mesh_sends_only_its_transform() {
    let mut mesh = textured_quad();
    mesh.flags |= meshsync_shared::MeshDataFlags::UNCHANGED;

    let decoded = round_trip(&mesh);
    assert_eq!(decoded.transform, mesh.transform);
    assert!(decoded.points.is_empty());
}

// ============================================================================
// Assets
// ============================================================================

#[test]
fn test_file_asset_round_trips() {
    let asset = Asset::File(FileAsset {
        id: 3,
        name: String::from("notes.txt"),
        data: b"hello".to_vec(),
    });
    assert_eq!(round_trip(&asset), asset);
}

#[test]
fn test_audio_asset_round_trips() {
    let asset = Asset::Audio(Audio {
        id: 4,
        name: String::from("click"),
        format: AudioFormat::S16,
        frequency: 48000,
        channels: 2,
        data: vec![0, 1, 2, 3, 4, 5, 6, 7],
    });
    assert_eq!(round_trip(&asset), asset);
}

#[test]
fn test_texture_asset_round_trips() {
    let mut texture = Texture::new("albedo");
    texture.id = 5;
    texture.texture_type = TextureType::NormalMap;
    texture.format = TextureFormat::RGBAu8;
    texture.width = 2;
    texture.height = 1;
    texture.data = vec![255, 0, 0, 255, 0, 255, 0, 255];

    let asset = Asset::from(texture);
    assert_eq!(round_trip(&asset), asset);
}

#[test]
fn test_material_asset_round_trips() {
    let mut material = Material::new(6, "painted");
    material.index = 1;
    material.shader = String::from("Standard");
    material.set_property("_Mode", PropertyValue::Int(2));
    material.set_property("_Glossiness", PropertyValue::Float(0.4));
    material.set_property("_Color", PropertyValue::Vector(Vec4::new(0.2, 0.4, 0.6, 1.0)));
    material.set_property("_Uv", PropertyValue::Matrix(Mat4::IDENTITY));
    material.set_property("_MainTex", PropertyValue::Texture(5));

    let asset = Asset::from(material);
    assert_eq!(round_trip(&asset), asset);
}

#[test]
fn test_animation_asset_round_trips() {
    let mut animation = TransformAnimation::new("/root/body");
    animation.translation = vec![Key::new(0.0, Vec3::ZERO), Key::new(1.0, Vec3::X)];
    animation.rotation = vec![Key::new(0.5, Quat::from_rotation_z(0.3))];
    animation.scale = vec![Key::new(0.0, Vec3::ONE)];
    animation.visible = vec![Key::new(0.0, true), Key::new(2.0, false)];

    let mut clip = AnimationClip::new("walk");
    clip.id = 7;
    clip.frame_rate = 30.0;
    clip.animations.push(animation);

    let asset = Asset::Animation(clip);
    assert_eq!(round_trip(&asset), asset);
}

// ============================================================================
// Messages
// ============================================================================

#[test]
fn test_get_message_round_trips() {
    let mut get = GetMessage::default();
    get.header.session_id = 12;
    get.flags = GetFlags::TRANSFORM | GetFlags::POINTS | GetFlags::INDICES | GetFlags::BONES;
    get.scene_settings.name = String::from("stage");
    get.scene_settings.handedness = Handedness::RightZUp;
    get.scene_settings.scale_factor = 100.0;
    get.refine_settings.flags = MeshRefineFlags::TRIANGULATE | MeshRefineFlags::SPLIT;
    get.refine_settings.split_unit = 65000;
    message_round_trip(get);
}

#[test]
fn test_text_message_round_trips() {
    for text_type in [TextType::Normal, TextType::Warning, TextType::Error] {
        message_round_trip(TextMessage::new("export finished: 12 objects", text_type));
    }
}

#[test]
fn test_query_message_round_trips() {
    let mut query = QueryMessage::new(QueryType::AllNodes);
    query.header.session_id = 2;
    message_round_trip(query);
}

#[test]
fn test_poll_message_round_trips() {
    message_round_trip(PollMessage::new(PollType::SceneUpdate));
}

#[test]
fn test_screenshot_message_round_trips() {
    let mut screenshot = ScreenshotMessage::default();
    screenshot.header.session_id = 9;
    message_round_trip(screenshot);
}

#[test]
fn test_set_message_carries_every_kind() {
    let mut scene = Scene::default();
    scene.add_entity(Camera::new("/root/camera"));
    scene.add_entity(Light::new("/root/light", LightType::Point));
    scene.add_entity(Points::new("/root/cloud"));
    scene.add_entity(textured_quad());
    scene.add_asset(Material::new(1, "default"));
    scene.add_asset(Texture::new("albedo"));

    message_round_trip(SetMessage::new(scene));
}
