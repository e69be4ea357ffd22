//! Hierarchy divergence warnings.
//!
//! Hot-swap facilities usually reject hierarchy changes; the warnings explain
//! a following rejection. They never stop a reload.

use std::collections::BTreeSet;

use super::runtime::LoadedClass;
use crate::classfile::{ClassFile, ClassFileError, ClassId};

/// Compare the loaded class with its replacement.
pub fn diagnose(loaded: &LoadedClass, replacement: &ClassFile) -> Result<Vec<String>, ClassFileError> {
    let mut warnings = Vec::new();

    let new_super = replacement.super_name()?.map(ClassId::new);
    if loaded.superclass != new_super {
        warnings.push(format!(
            "⚠ superclass: '{}' -> '{}'",
            display(loaded.superclass.as_ref()),
            display(new_super.as_ref()),
        ));
    }

    let old: BTreeSet<&str> = loaded.interfaces.iter().map(ClassId::as_str).collect();
    let new_names = replacement.interface_names()?;
    let new: BTreeSet<&str> = new_names.iter().map(String::as_str).collect();

    for added in new.difference(&old) {
        warnings.push(format!("⚠ +interface: '{added}'"));
    }
    for removed in old.difference(&new) {
        warnings.push(format!("⚠ -interface: '{removed}'"));
    }

    Ok(warnings)
}

fn display(id: Option<&ClassId>) -> &str {
    id.map_or("<none>", ClassId::as_str)
}
