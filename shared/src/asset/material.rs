use glam::{Mat4, Vec4};

use meshsync_serde::{checksum_bytes, ByteReader, ByteWriter, Serde, SerdeErr};

use crate::constants::INVALID_ID;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i32),
    Float(f32),
    Vector(Vec4),
    Matrix(Mat4),
    /// Id of a texture asset
    Texture(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialProperty {
    pub name: String,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: i32,
    pub name: String,
    /// Slot of the material in the source application
    pub index: i32,
    pub shader: String,
    pub properties: Vec<MaterialProperty>,
}

impl Material {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| &property.value)
    }

    /// Inserts or replaces a property.
    pub fn set_property(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(property) => property.value = value,
            None => self.properties.push(MaterialProperty { name, value }),
        }
    }

    pub fn checksum(&self) -> u64 {
        let mut writer = ByteWriter::with_capacity(self.byte_length());
        self.ser(&mut writer);
        checksum_bytes(&writer.to_bytes())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            id: INVALID_ID,
            name: String::new(),
            index: 0,
            shader: String::new(),
            properties: Vec::new(),
        }
    }
}

impl Serde for MaterialProperty {
    fn ser(&self, writer: &mut ByteWriter) {
        self.name.ser(writer);
        match &self.value {
            PropertyValue::Int(value) => {
                0i32.ser(writer);
                value.ser(writer);
            }
            PropertyValue::Float(value) => {
                1i32.ser(writer);
                value.ser(writer);
            }
            PropertyValue::Vector(value) => {
                2i32.ser(writer);
                value.ser(writer);
            }
            PropertyValue::Matrix(value) => {
                3i32.ser(writer);
                value.ser(writer);
            }
            PropertyValue::Texture(value) => {
                4i32.ser(writer);
                value.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let name = String::de(reader)?;
        let value = match i32::de(reader)? {
            0 => PropertyValue::Int(i32::de(reader)?),
            1 => PropertyValue::Float(f32::de(reader)?),
            2 => PropertyValue::Vector(Vec4::de(reader)?),
            3 => PropertyValue::Matrix(Mat4::de(reader)?),
            4 => PropertyValue::Texture(i32::de(reader)?),
            tag => {
                return Err(SerdeErr::InvalidDiscriminant {
                    type_name: "PropertyValue",
                    value: tag.into(),
                })
            }
        };
        Ok(Self { name, value })
    }

    fn byte_length(&self) -> usize {
        let value_length = match self.value {
            PropertyValue::Int(_) | PropertyValue::Float(_) | PropertyValue::Texture(_) => 4,
            PropertyValue::Vector(_) => 16,
            PropertyValue::Matrix(_) => 64,
        };
        self.name.byte_length() + 4 + value_length
    }
}

impl Serde for Material {
    fn ser(&self, writer: &mut ByteWriter) {
        self.id.ser(writer);
        self.name.ser(writer);
        self.index.ser(writer);
        self.shader.ser(writer);
        self.properties.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            id: i32::de(reader)?,
            name: String::de(reader)?,
            index: i32::de(reader)?,
            shader: String::de(reader)?,
            properties: Vec::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        4 + self.name.byte_length()
            + 4
            + self.shader.byte_length()
            + self.properties.byte_length()
    }
}
