use meshsync_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::constants::INVALID_ID;

/// Stable key of a synced object across send cycles
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Identifier {
    pub name: String,
    pub id: i32,
}

impl Identifier {
    pub fn new(name: impl Into<String>, id: i32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        Self::new(name, INVALID_ID)
    }

    /// Same logical object if the names match, or if both ids are assigned and equal.
    pub fn matches(&self, other: &Identifier) -> bool {
        if !self.name.is_empty() && self.name == other.name {
            return true;
        }
        self.id != INVALID_ID && other.id != INVALID_ID && self.id == other.id
    }
}

impl Serde for Identifier {
    fn ser(&self, writer: &mut ByteWriter) {
        self.name.ser(writer);
        self.id.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let name = String::de(reader)?;
        let id = i32::de(reader)?;
        Ok(Self { name, id })
    }

    fn byte_length(&self) -> usize {
        self.name.byte_length() + 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_match_wins() {
        let a = Identifier::new("/a", 1);
        let b = Identifier::new("/a", 2);
        assert!(a.matches(&b));
    }

    #[test]
    fn id_match_requires_both_valid() {
        let a = Identifier::new("/a", 3);
        let b = Identifier::new("/b", 3);
        assert!(a.matches(&b));

        let c = Identifier::new("/c", INVALID_ID);
        let d = Identifier::new("/d", INVALID_ID);
        assert!(!c.matches(&d));
    }

    #[test]
    fn empty_names_never_match_by_name() {
        let a = Identifier::new("", INVALID_ID);
        let b = Identifier::new("", INVALID_ID);
        assert!(!a.matches(&b));
    }
}
