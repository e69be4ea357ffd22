//! Class identity.

use std::fmt;

use super::bytes::Reader;
use super::{ClassFileError, Header};

/// Internal binary name of a class, e.g. `com/example/Foo$Inner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(internal_name: impl Into<String>) -> Self {
        Self(internal_name.into())
    }

    /// Derive the identity from raw class-file bytes.
    ///
    /// Only the constant pool and `this_class` are decoded.
    pub fn from_bytecode(bytes: &[u8]) -> Result<Self, ClassFileError> {
        let header = Header::read(&mut Reader::new(bytes))?;
        let name = header.constant_pool.class_name(header.this_class)?;
        Ok(Self(name.into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dotted name as used by reflection (`com.example.Foo$Inner`).
    pub fn to_fqn(&self) -> String {
        self.0.replace('/', ".")
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
