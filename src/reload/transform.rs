//! Static initializer transform.
//!
//! Redefinition keeps the static state of a class. Renaming `<clinit>` to a
//! regular static method keeps the initializer callable, so the runtime can
//! run it again when the reinitialization policy asks for it.

use crate::classfile::{ACC_PUBLIC, ACC_STATIC, ACC_SYNTHETIC, CLINIT, ClassFile};

/// Name the static initializer is renamed to.
pub const REINITIALIZER: &str = "$hr$clinit";

const REINITIALIZER_FLAGS: u16 = ACC_PUBLIC | ACC_STATIC | ACC_SYNTHETIC;

/// The constant pool has no room for the reinitializer name.
#[derive(Debug, thiserror::Error)]
#[error("constant pool is full")]
pub struct ConstantPoolFull;

/// Rename the static initializer of `class` to [`REINITIALIZER`].
///
/// Returns whether the class had a static initializer. Every other part of
/// the class is left untouched.
pub fn transform_for_statics_initialization(class: &mut ClassFile) -> Result<bool, ConstantPoolFull> {
    let Some(position) = class.method_position(CLINIT) else {
        return Ok(false);
    };

    let name_index = class
        .constant_pool
        .push_utf8(REINITIALIZER)
        .ok_or(ConstantPoolFull)?;

    let method = &mut class.methods[position];
    method.name_index = name_index;
    method.access_flags = REINITIALIZER_FLAGS;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::testing::ClassBuilder;

    #[test]
    fn test_clinit_renamed() {
        let bytes = ClassBuilder::new("A")
            .static_field("x", "I")
            .clinit(&[0x04, 0xB3, 0x00, 0x00, 0xB1])
            .build();
        let mut class = ClassFile::parse(&bytes).unwrap();
        let original_code = class.method(CLINIT).unwrap().attributes.clone();

        assert!(transform_for_statics_initialization(&mut class).unwrap());
        assert!(class.method(CLINIT).is_none());

        let method = class.method(REINITIALIZER).unwrap();
        assert_eq!(method.access_flags, ACC_PUBLIC | ACC_STATIC | ACC_SYNTHETIC);
        assert_eq!(method.attributes, original_code);

        // Re-encodes and parses back
        let reparsed = ClassFile::parse(&class.to_bytes()).unwrap();
        assert!(reparsed.method(REINITIALIZER).is_some());
    }

    #[test]
    fn test_class_without_initializer_untouched() {
        let bytes = ClassBuilder::new("A").method("run", "()V", &[0xB1]).build();
        let mut class = ClassFile::parse(&bytes).unwrap();

        assert!(!transform_for_statics_initialization(&mut class).unwrap());
        assert_eq!(class.to_bytes(), bytes);
    }
}
