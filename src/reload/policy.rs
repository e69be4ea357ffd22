//! Static state reinitialization policy.

use super::info::ClassInfo;
use crate::classfile::ClassId;
use crate::utils::hash;

/// Decides, per replaced class, whether its static state must be reset.
///
/// Closures `Fn(&ClassId, Option<&ClassInfo>, Option<&ClassInfo>) -> bool`
/// implement this trait.
pub trait ReinitPolicy: Send + Sync {
    fn requires_reinit(
        &self,
        id: &ClassId,
        previous: Option<&ClassInfo>,
        current: Option<&ClassInfo>,
    ) -> bool;
}

impl<F> ReinitPolicy for F
where
    F: Fn(&ClassId, Option<&ClassInfo>, Option<&ClassInfo>) -> bool + Send + Sync,
{
    fn requires_reinit(
        &self,
        id: &ClassId,
        previous: Option<&ClassInfo>,
        current: Option<&ClassInfo>,
    ) -> bool {
        self(id, previous, current)
    }
}

/// Reinitialize when the set of static fields or the static initializer
/// body changed.
///
/// A class missing from either snapshot keeps its state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticShapePolicy;

impl ReinitPolicy for StaticShapePolicy {
    fn requires_reinit(
        &self,
        id: &ClassId,
        previous: Option<&ClassInfo>,
        current: Option<&ClassInfo>,
    ) -> bool {
        let (Some(previous), Some(current)) = (previous, current) else {
            return false;
        };

        if previous.static_fields != current.static_fields {
            crate::debug!("reload"; "{}: static fields changed", id);
            return true;
        }

        if previous.initializer != current.initializer {
            crate::debug!(
                "reload";
                "{}: static initializer changed ({} -> {})",
                id,
                fingerprint(previous.initializer),
                fingerprint(current.initializer)
            );
            return true;
        }

        false
    }
}

fn fingerprint(initializer: Option<u64>) -> String {
    initializer.map_or_else(|| "none".to_string(), |h| hash::fingerprint(&h.to_be_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::info::StaticField;

    fn info(fields: &[(&str, &str)], initializer: Option<u64>) -> ClassInfo {
        ClassInfo {
            id: ClassId::new("A"),
            superclass: None,
            interfaces: Vec::new(),
            static_fields: fields
                .iter()
                .map(|(name, descriptor)| StaticField {
                    name: name.to_string(),
                    descriptor: descriptor.to_string(),
                })
                .collect(),
            initializer,
        }
    }

    #[test]
    fn test_unchanged_shape_keeps_state() {
        let id = ClassId::new("A");
        let before = info(&[("x", "I")], Some(1));
        assert!(!StaticShapePolicy.requires_reinit(&id, Some(&before), Some(&before.clone())));
    }

    #[test]
    fn test_changed_shape_requires_reinit() {
        let id = ClassId::new("A");
        let before = info(&[("x", "I")], Some(1));

        let retyped = info(&[("x", "J")], Some(1));
        assert!(StaticShapePolicy.requires_reinit(&id, Some(&before), Some(&retyped)));

        let added = info(&[("x", "I"), ("y", "I")], Some(1));
        assert!(StaticShapePolicy.requires_reinit(&id, Some(&before), Some(&added)));

        let new_body = info(&[("x", "I")], Some(2));
        assert!(StaticShapePolicy.requires_reinit(&id, Some(&before), Some(&new_body)));
    }

    #[test]
    fn test_missing_snapshot_keeps_state() {
        let id = ClassId::new("A");
        let current = info(&[("x", "I")], Some(1));
        assert!(!StaticShapePolicy.requires_reinit(&id, None, Some(&current)));
        assert!(!StaticShapePolicy.requires_reinit(&id, Some(&current), None));
    }

    #[test]
    fn test_closure_policy() {
        let always = |_: &ClassId, _: Option<&ClassInfo>, _: Option<&ClassInfo>| true;
        assert!(always.requires_reinit(&ClassId::new("A"), None, None));
    }
}
