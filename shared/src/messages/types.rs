use bitflags::bitflags;

use meshsync_serde::{ByteReader, ByteWriter, ConstByteLength, Serde, SerdeErr};

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$variant_meta:meta])* $variant:ident = $value:literal,)* }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(i32)]
        pub enum $name {
            $($(#[$variant_meta])* $variant = $value,)*
        }

        impl TryFrom<i32> for $name {
            type Error = SerdeErr;

            fn try_from(value: i32) -> Result<Self, SerdeErr> {
                match value {
                    $($value => Ok(Self::$variant),)*
                    _ => Err(SerdeErr::InvalidDiscriminant {
                        type_name: stringify!($name),
                        value: value.into(),
                    }),
                }
            }
        }

        impl Serde for $name {
            fn ser(&self, writer: &mut ByteWriter) {
                (*self as i32).ser(writer);
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                Self::try_from(i32::de(reader)?)
            }

            fn byte_length(&self) -> usize {
                <Self as ConstByteLength>::BYTE_LENGTH
            }
        }

        impl ConstByteLength for $name {
            const BYTE_LENGTH: usize = 4;
        }
    };
}

wire_enum! {
    pub enum FenceType {
        #[default]
        Unknown = 0,
        SceneBegin = 1,
        SceneEnd = 2,
    }
}

wire_enum! {
    pub enum TextType {
        #[default]
        Normal = 0,
        Warning = 1,
        Error = 2,
    }
}

wire_enum! {
    pub enum QueryType {
        #[default]
        Unknown = 0,
        PluginVersion = 1,
        ProtocolVersion = 2,
        HostName = 3,
        RootNodes = 4,
        AllNodes = 5,
    }
}

wire_enum! {
    pub enum PollType {
        #[default]
        Unknown = 0,
        SceneUpdate = 1,
    }
}

bitflags! {
    /// Parts of the host scene a Get asks for
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GetFlags: u32 {
        const TRANSFORM = 1 << 0;
        const POINTS = 1 << 1;
        const NORMALS = 1 << 2;
        const TANGENTS = 1 << 3;
        const UV0 = 1 << 4;
        const UV1 = 1 << 5;
        const COLORS = 1 << 6;
        const INDICES = 1 << 7;
        const MATERIAL_IDS = 1 << 8;
        const BONES = 1 << 9;
        const BLENDSHAPES = 1 << 10;
        const APPLY_CULLING = 1 << 11;
    }
}

impl Serde for GetFlags {
    fn ser(&self, writer: &mut ByteWriter) {
        self.bits().ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self::from_bits_retain(u32::de(reader)?))
    }

    fn byte_length(&self) -> usize {
        4
    }
}
