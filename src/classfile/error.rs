use thiserror::Error;

/// Errors raised while decoding a class file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFileError {
    #[error("truncated class file at offset {0}")]
    Truncated(usize),

    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: u16 },

    #[error("invalid constant pool index {0}")]
    BadIndex(u16),

    #[error("{0} trailing bytes after class file")]
    TrailingBytes(usize),
}
