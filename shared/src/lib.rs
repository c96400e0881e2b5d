//! # MeshSync Shared
//! Scene model, wire messages, mesh refinement and dirty tracking shared
//! between meshsync-server & meshsync-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use meshsync_serde::{
    checksum_bytes, checksum_pod, checksum_str, hash_bytes, hash_combine, hash_pod, ByteReader,
    ByteWriter, ConstByteLength, Serde, SerdeErr,
};

mod asset;
mod constants;
mod identifier;
mod managers;
mod messages;
mod pool;
mod refine;
mod scene;

pub use asset::{
    AnimationClip, Asset, AssetType, Audio, AudioFormat, FileAsset, Key, Material,
    MaterialProperty, PropertyValue, Texture, TextureFormat, TextureType, TransformAnimation,
};
pub use constants::{DEFAULT_PORT, INVALID_ID, PLUGIN_VERSION, PROTOCOL_VERSION};
pub use identifier::Identifier;
pub use managers::{EntityManager, MaterialManager, TextureManager};
pub use messages::{
    now_ticks, DeleteMessage, FenceMessage, FenceType, GetFlags, GetMessage, Message,
    MessageBody, MessageHeader, MessageKind, PollMessage, PollType, ProtocolError, QueryMessage,
    QueryType, ResponseMessage, ScreenshotMessage, SetMessage, TextMessage, TextType,
};
pub use pool::{Pool, Poolable, Pooled};
pub use refine::{
    face_normal, generate_normals_poly, generate_normals_with_smooth_angle, generate_tangents,
    CornerAttribute, MeshRefineFlags, MeshRefineSettings, MeshRefiner, RefineError,
};
pub use scene::{
    flip_x, flip_x_quat, swap_yz, swap_yz_quat, AxisConversion, BlendShapeData, BlendShapeFrame,
    BoneData, Bounds, Camera, Entity, EntityType, Handedness, Light, LightType, Mesh,
    MeshDataFlags, Points, Scene, SceneSettings, ShadowType, SplitData, SubmeshData, Topology,
    Transform,
};
