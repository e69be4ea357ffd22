//! Constant pool.
//!
//! Indices are 1-based. `Long` and `Double` occupy two slots; the second
//! slot holds [`Constant::Unusable`], as does slot 0.

use std::borrow::Cow;

use super::ClassFileError;
use super::bytes::{Reader, Writer};

/// One constant pool entry, kept in its encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    /// Modified UTF-8, kept as raw bytes so re-encoding is lossless
    Utf8(Vec<u8>),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    Unusable,
}

impl Constant {
    /// Whether the entry takes two pool slots.
    const fn is_wide(&self) -> bool {
        matches!(self, Self::Long(_) | Self::Double(_))
    }

    fn read(reader: &mut Reader<'_>, index: u16) -> Result<Self, ClassFileError> {
        let tag = reader.u8()?;
        let constant = match tag {
            1 => {
                let len = reader.u16()?;
                Self::Utf8(reader.bytes(usize::from(len))?.to_vec())
            }
            3 => Self::Integer(reader.u32()?),
            4 => Self::Float(reader.u32()?),
            5 => Self::Long(reader.u64()?),
            6 => Self::Double(reader.u64()?),
            7 => Self::Class { name_index: reader.u16()? },
            8 => Self::String { string_index: reader.u16()? },
            9 => Self::Fieldref {
                class_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            10 => Self::Methodref {
                class_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            11 => Self::InterfaceMethodref {
                class_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            12 => Self::NameAndType {
                name_index: reader.u16()?,
                descriptor_index: reader.u16()?,
            },
            15 => Self::MethodHandle {
                reference_kind: reader.u8()?,
                reference_index: reader.u16()?,
            },
            16 => Self::MethodType { descriptor_index: reader.u16()? },
            17 => Self::Dynamic {
                bootstrap_method_attr_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            18 => Self::InvokeDynamic {
                bootstrap_method_attr_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            19 => Self::Module { name_index: reader.u16()? },
            20 => Self::Package { name_index: reader.u16()? },
            tag => return Err(ClassFileError::UnknownTag { tag, index }),
        };
        Ok(constant)
    }

    fn write(&self, out: &mut Writer) {
        match self {
            Self::Utf8(bytes) => {
                out.u8(1);
                // Lengths above u16::MAX are rejected by `push_utf8` and never parsed
                out.u16(bytes.len() as u16);
                out.bytes(bytes);
            }
            Self::Integer(v) => {
                out.u8(3);
                out.u32(*v);
            }
            Self::Float(v) => {
                out.u8(4);
                out.u32(*v);
            }
            Self::Long(v) => {
                out.u8(5);
                out.u64(*v);
            }
            Self::Double(v) => {
                out.u8(6);
                out.u64(*v);
            }
            Self::Class { name_index } => {
                out.u8(7);
                out.u16(*name_index);
            }
            Self::String { string_index } => {
                out.u8(8);
                out.u16(*string_index);
            }
            Self::Fieldref { class_index, name_and_type_index } => {
                out.u8(9);
                out.u16(*class_index);
                out.u16(*name_and_type_index);
            }
            Self::Methodref { class_index, name_and_type_index } => {
                out.u8(10);
                out.u16(*class_index);
                out.u16(*name_and_type_index);
            }
            Self::InterfaceMethodref { class_index, name_and_type_index } => {
                out.u8(11);
                out.u16(*class_index);
                out.u16(*name_and_type_index);
            }
            Self::NameAndType { name_index, descriptor_index } => {
                out.u8(12);
                out.u16(*name_index);
                out.u16(*descriptor_index);
            }
            Self::MethodHandle { reference_kind, reference_index } => {
                out.u8(15);
                out.u8(*reference_kind);
                out.u16(*reference_index);
            }
            Self::MethodType { descriptor_index } => {
                out.u8(16);
                out.u16(*descriptor_index);
            }
            Self::Dynamic { bootstrap_method_attr_index, name_and_type_index } => {
                out.u8(17);
                out.u16(*bootstrap_method_attr_index);
                out.u16(*name_and_type_index);
            }
            Self::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
                out.u8(18);
                out.u16(*bootstrap_method_attr_index);
                out.u16(*name_and_type_index);
            }
            Self::Module { name_index } => {
                out.u8(19);
                out.u16(*name_index);
            }
            Self::Package { name_index } => {
                out.u8(20);
                out.u16(*name_index);
            }
            Self::Unusable => {}
        }
    }
}

/// Constant pool of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self {
            entries: vec![Constant::Unusable],
        }
    }
}

impl ConstantPool {
    pub(super) fn read(reader: &mut Reader<'_>) -> Result<Self, ClassFileError> {
        let count = reader.u16()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        entries.push(Constant::Unusable);

        let mut index = 1;
        while index < count {
            let constant = Constant::read(reader, index)?;
            let wide = constant.is_wide();
            entries.push(constant);
            index += 1;
            if wide {
                entries.push(Constant::Unusable);
                index += 1;
            }
        }

        // A wide entry in the last slot overflows the declared count
        if entries.len() != usize::from(count.max(1)) {
            return Err(ClassFileError::BadIndex(count));
        }
        Ok(Self { entries })
    }

    pub(super) fn write(&self, out: &mut Writer) {
        out.u16(self.count());
        for entry in &self.entries {
            entry.write(out);
        }
    }

    /// Encoded `constant_pool_count` (number of slots including slot 0).
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    /// Entry at `index`.
    pub fn get(&self, index: u16) -> Result<&Constant, ClassFileError> {
        match self.entries.get(usize::from(index)) {
            Some(Constant::Unusable) | None => Err(ClassFileError::BadIndex(index)),
            Some(constant) => Ok(constant),
        }
    }

    /// Decoded `Utf8` entry at `index`.
    pub fn utf8(&self, index: u16) -> Result<Cow<'_, str>, ClassFileError> {
        match self.get(index)? {
            Constant::Utf8(bytes) => Ok(String::from_utf8_lossy(bytes)),
            _ => Err(ClassFileError::BadIndex(index)),
        }
    }

    /// Internal name of the `Class` entry at `index`.
    pub fn class_name(&self, index: u16) -> Result<Cow<'_, str>, ClassFileError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFileError::BadIndex(index)),
        }
    }

    /// Index of a `Utf8` entry equal to `value`, appending one if absent.
    ///
    /// Returns `None` when the pool or the string exceeds the format limits.
    pub fn push_utf8(&mut self, value: &str) -> Option<u16> {
        let bytes = value.as_bytes();
        if let Some(index) = self
            .entries
            .iter()
            .position(|e| matches!(e, Constant::Utf8(b) if b == bytes))
        {
            return u16::try_from(index).ok();
        }

        if bytes.len() > usize::from(u16::MAX) {
            return None;
        }
        self.push(Constant::Utf8(bytes.to_vec()))
    }

    /// Append an entry, returning its index.
    pub fn push(&mut self, constant: Constant) -> Option<u16> {
        let wide = constant.is_wide();
        let slots = if wide { 2 } else { 1 };
        let index = u16::try_from(self.entries.len()).ok()?;
        if usize::from(index) + slots > usize::from(u16::MAX) {
            return None;
        }
        self.entries.push(constant);
        if wide {
            self.entries.push(Constant::Unusable);
        }
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_bytes(count: u16, body: &[u8]) -> Vec<u8> {
        let mut bytes = count.to_be_bytes().to_vec();
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn test_wide_entries_take_two_slots() {
        // #1 Long, #3 Utf8 "A", #4 Class #3
        let mut body = vec![5, 0, 0, 0, 0, 0, 0, 0, 42];
        body.extend_from_slice(&[1, 0, 1, b'A', 7, 0, 3]);
        let pool = ConstantPool::read(&mut Reader::new(&pool_bytes(5, &body))).unwrap();

        assert_eq!(pool.get(1), Ok(&Constant::Long(42)));
        assert_eq!(pool.get(2), Err(ClassFileError::BadIndex(2)));
        assert_eq!(pool.class_name(4).unwrap(), "A");

        let mut out = Writer::default();
        pool.write(&mut out);
        assert_eq!(out.into_bytes(), pool_bytes(5, &body));
    }

    #[test]
    fn test_unknown_tag() {
        let err = ConstantPool::read(&mut Reader::new(&pool_bytes(2, &[2, 0, 0]))).unwrap_err();
        assert_eq!(err, ClassFileError::UnknownTag { tag: 2, index: 1 });
    }

    #[test]
    fn test_wide_entry_overflowing_count() {
        let body = [6, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(ConstantPool::read(&mut Reader::new(&pool_bytes(2, &body))).is_err());
    }

    #[test]
    fn test_push_utf8_reuses_existing() {
        let mut pool = ConstantPool::default();
        let first = pool.push_utf8("<clinit>").unwrap();
        assert_eq!(pool.push_utf8("<clinit>"), Some(first));
        assert_eq!(pool.push_utf8("$hr$clinit"), Some(first + 1));
        assert_eq!(pool.count(), 3);
    }
}
