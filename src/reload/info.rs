//! Structural metadata of loaded classes.
//!
//! A [`RuntimeInfo`] is captured before and after each redefinition batch;
//! the reinitialization policy compares the two per class.

use rustc_hash::FxHashMap;

use super::transform::REINITIALIZER;
use crate::classfile::{CLINIT, ClassFile, ClassFileError, ClassId};
use crate::utils::hash;

/// A static field, by name and type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StaticField {
    pub name: String,
    pub descriptor: String,
}

/// Shape of one class relevant to static state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub id: ClassId,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    /// Sorted by name, then descriptor
    pub static_fields: Vec<StaticField>,
    /// Hash of the static initializer body, `None` without initializer
    pub initializer: Option<u64>,
}

impl ClassInfo {
    /// Analyze raw class-file bytes.
    pub fn analyze(bytes: &[u8]) -> Result<Self, ClassFileError> {
        Self::from_class(&ClassFile::parse(bytes)?)
    }

    pub fn from_class(class: &ClassFile) -> Result<Self, ClassFileError> {
        let mut static_fields = class
            .fields
            .iter()
            .filter(|f| f.is_static())
            .map(|f| {
                Ok(StaticField {
                    name: class.member_name(f)?.into_owned(),
                    descriptor: class.member_descriptor(f)?.into_owned(),
                })
            })
            .collect::<Result<Vec<_>, ClassFileError>>()?;
        static_fields.sort();

        // Before the first reload the initializer still has its original name
        let initializer = class
            .method(CLINIT)
            .or_else(|| class.method(REINITIALIZER))
            .and_then(|m| class.attribute(&m.attributes, "Code"))
            .map(|code| hash::compute(&code.info));

        Ok(Self {
            id: ClassId::new(class.name()?),
            superclass: class.super_name()?.map(ClassId::new),
            interfaces: class
                .interface_names()?
                .into_iter()
                .map(ClassId::new)
                .collect(),
            static_fields,
            initializer,
        })
    }
}

/// Snapshot of all loaded classes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeInfo {
    classes: FxHashMap<ClassId, ClassInfo>,
}

impl RuntimeInfo {
    pub fn insert(&mut self, info: ClassInfo) {
        self.classes.insert(info.id.clone(), info);
    }

    pub fn get(&self, id: &ClassId) -> Option<&ClassInfo> {
        self.classes.get(id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassInfo> for RuntimeInfo {
    fn from_iter<I: IntoIterator<Item = ClassInfo>>(iter: I) -> Self {
        let mut info = Self::default();
        for class in iter {
            info.insert(class);
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::testing::ClassBuilder;

    #[test]
    fn test_analyze_collects_static_shape() {
        let bytes = ClassBuilder::new("com/example/Foo")
            .superclass("com/example/Base")
            .interface("java/io/Serializable")
            .static_field("b", "I")
            .static_field("a", "J")
            .field("instance", "I")
            .clinit(&[0x04, 0xB1])
            .build();
        let info = ClassInfo::analyze(&bytes).unwrap();

        assert_eq!(info.id, ClassId::new("com/example/Foo"));
        assert_eq!(info.superclass, Some(ClassId::new("com/example/Base")));
        assert_eq!(info.interfaces, [ClassId::new("java/io/Serializable")]);
        let names: Vec<_> = info.static_fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(info.initializer.is_some());
    }

    #[test]
    fn test_initializer_hash_tracks_body() {
        let one = ClassBuilder::new("A").clinit(&[0x04, 0xB1]).build();
        let two = ClassBuilder::new("A").clinit(&[0x05, 0xB1]).build();
        let none = ClassBuilder::new("A").build();

        let one = ClassInfo::analyze(&one).unwrap().initializer;
        assert_ne!(one, ClassInfo::analyze(&two).unwrap().initializer);
        assert_eq!(ClassInfo::analyze(&none).unwrap().initializer, None);
    }

    #[test]
    fn test_runtime_info_lookup() {
        let info: RuntimeInfo = [ClassInfo::analyze(&ClassBuilder::new("A").build()).unwrap()]
            .into_iter()
            .collect();
        assert_eq!(info.len(), 1);
        assert!(info.get(&ClassId::new("A")).is_some());
        assert!(info.get(&ClassId::new("B")).is_none());
    }
}
