//! Class-file container codec.
//!
//! Reads and writes the structure of a compiled class (constant pool,
//! members, attributes) without interpreting instructions. Attributes stay
//! opaque byte blobs, so `parse` followed by `to_bytes` reproduces the input
//! byte for byte.
//!
//! ```text
//! magic | version | constant pool | flags this super | interfaces
//!       | fields  | methods       | attributes
//! ```

mod bytes;
mod constant;
mod error;
mod id;

#[cfg(test)]
pub(crate) mod testing;

pub use constant::{Constant, ConstantPool};
pub use error::ClassFileError;
pub use id::ClassId;

use std::borrow::Cow;

use bytes::{Reader, Writer};

pub const MAGIC: u32 = 0xCAFE_BABE;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_SYNTHETIC: u16 = 0x1000;

/// Name of the static initializer method.
pub const CLINIT: &str = "<clinit>";

/// An attribute with its payload left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

/// A field or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl MemberInfo {
    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }
}

/// A parsed class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<AttributeInfo>,
}

// ============================================================================
// Decoding
// ============================================================================

/// Header up to and including `this_class`.
struct Header {
    minor_version: u16,
    major_version: u16,
    constant_pool: ConstantPool,
    access_flags: u16,
    this_class: u16,
}

impl Header {
    fn read(reader: &mut Reader<'_>) -> Result<Self, ClassFileError> {
        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }
        Ok(Self {
            minor_version: reader.u16()?,
            major_version: reader.u16()?,
            constant_pool: ConstantPool::read(reader)?,
            access_flags: reader.u16()?,
            this_class: reader.u16()?,
        })
    }
}

impl ClassFile {
    /// Decode a complete class file.
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassFileError> {
        let mut reader = Reader::new(bytes);
        let header = Header::read(&mut reader)?;
        header.constant_pool.class_name(header.this_class)?;

        let super_class = reader.u16()?;
        let interfaces = (0..reader.u16()?)
            .map(|_| reader.u16())
            .collect::<Result<Vec<_>, _>>()?;
        let fields = read_members(&mut reader)?;
        let methods = read_members(&mut reader)?;
        let attributes = read_attributes(&mut reader)?;

        if reader.remaining() != 0 {
            return Err(ClassFileError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            minor_version: header.minor_version,
            major_version: header.major_version,
            constant_pool: header.constant_pool,
            access_flags: header.access_flags,
            this_class: header.this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Encode back into class-file bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Writer::default();
        out.u32(MAGIC);
        out.u16(self.minor_version);
        out.u16(self.major_version);
        self.constant_pool.write(&mut out);
        out.u16(self.access_flags);
        out.u16(self.this_class);
        out.u16(self.super_class);
        out.u16(self.interfaces.len() as u16);
        for interface in &self.interfaces {
            out.u16(*interface);
        }
        write_members(&mut out, &self.fields);
        write_members(&mut out, &self.methods);
        write_attributes(&mut out, &self.attributes);
        out.into_bytes()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Internal name of this class.
    pub fn name(&self) -> Result<Cow<'_, str>, ClassFileError> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Internal name of the superclass (`None` for `java/lang/Object`).
    pub fn super_name(&self) -> Result<Option<Cow<'_, str>>, ClassFileError> {
        match self.super_class {
            0 => Ok(None),
            index => self.constant_pool.class_name(index).map(Some),
        }
    }

    /// Internal names of the directly implemented interfaces.
    pub fn interface_names(&self) -> Result<Vec<String>, ClassFileError> {
        self.interfaces
            .iter()
            .map(|index| self.constant_pool.class_name(*index).map(Cow::into_owned))
            .collect()
    }

    pub fn member_name(&self, member: &MemberInfo) -> Result<Cow<'_, str>, ClassFileError> {
        self.constant_pool.utf8(member.name_index)
    }

    pub fn member_descriptor(&self, member: &MemberInfo) -> Result<Cow<'_, str>, ClassFileError> {
        self.constant_pool.utf8(member.descriptor_index)
    }

    /// Position of the first method called `name`.
    pub fn method_position(&self, name: &str) -> Option<usize> {
        self.methods
            .iter()
            .position(|m| self.member_name(m).is_ok_and(|n| n == name))
    }

    pub fn method(&self, name: &str) -> Option<&MemberInfo> {
        self.method_position(name).map(|i| &self.methods[i])
    }

    /// Attribute called `name` among `attributes`.
    pub fn attribute<'a>(&self, attributes: &'a [AttributeInfo], name: &str) -> Option<&'a AttributeInfo> {
        attributes
            .iter()
            .find(|a| self.constant_pool.utf8(a.name_index).is_ok_and(|n| n == name))
    }
}

fn read_attributes(reader: &mut Reader<'_>) -> Result<Vec<AttributeInfo>, ClassFileError> {
    (0..reader.u16()?)
        .map(|_| {
            let name_index = reader.u16()?;
            let len = reader.u32()? as usize;
            let info = reader.bytes(len)?.to_vec();
            Ok(AttributeInfo { name_index, info })
        })
        .collect()
}

fn read_members(reader: &mut Reader<'_>) -> Result<Vec<MemberInfo>, ClassFileError> {
    (0..reader.u16()?)
        .map(|_| {
            Ok(MemberInfo {
                access_flags: reader.u16()?,
                name_index: reader.u16()?,
                descriptor_index: reader.u16()?,
                attributes: read_attributes(reader)?,
            })
        })
        .collect()
}

fn write_attributes(out: &mut Writer, attributes: &[AttributeInfo]) {
    out.u16(attributes.len() as u16);
    for attribute in attributes {
        out.u16(attribute.name_index);
        out.u32(attribute.info.len() as u32);
        out.bytes(&attribute.info);
    }
}

fn write_members(out: &mut Writer, members: &[MemberInfo]) {
    out.u16(members.len() as u16);
    for member in members {
        out.u16(member.access_flags);
        out.u16(member.name_index);
        out.u16(member.descriptor_index);
        write_attributes(out, &member.attributes);
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ClassBuilder;
    use super::*;

    #[test]
    fn test_round_trip_is_byte_identical() {
        let bytes = ClassBuilder::new("com/example/Foo")
            .interface("java/lang/Runnable")
            .static_field("COUNT", "I")
            .field("name", "Ljava/lang/String;")
            .method("run", "()V", &[0xB1])
            .clinit(&[0x03, 0xB3, 0x00, 0x00, 0xB1])
            .long_constant(7)
            .build();

        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.to_bytes(), bytes);
    }

    #[test]
    fn test_queries() {
        let bytes = ClassBuilder::new("com/example/Foo")
            .superclass("com/example/Base")
            .interface("java/lang/Runnable")
            .static_field("COUNT", "I")
            .clinit(&[0xB1])
            .build();
        let class = ClassFile::parse(&bytes).unwrap();

        assert_eq!(class.name().unwrap(), "com/example/Foo");
        assert_eq!(class.super_name().unwrap().as_deref(), Some("com/example/Base"));
        assert_eq!(class.interface_names().unwrap(), ["java/lang/Runnable"]);
        assert!(class.fields[0].is_static());
        assert!(class.method(CLINIT).is_some());
        assert!(class.method("missing").is_none());

        let clinit = class.method(CLINIT).unwrap();
        assert!(class.attribute(&clinit.attributes, "Code").is_some());
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = ClassBuilder::new("A").build();
        bytes[0] = 0;
        assert_eq!(ClassFile::parse(&bytes), Err(ClassFileError::BadMagic(0x00FE_BABE)));
    }

    #[test]
    fn test_truncated() {
        let bytes = ClassBuilder::new("A").method("m", "()V", &[0xB1]).build();
        for len in [0, 3, 9, bytes.len() - 1] {
            assert!(
                matches!(ClassFile::parse(&bytes[..len]), Err(ClassFileError::Truncated(_))),
                "length {len}"
            );
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = ClassBuilder::new("A").build();
        bytes.push(0);
        assert_eq!(ClassFile::parse(&bytes), Err(ClassFileError::TrailingBytes(1)));
    }
}
