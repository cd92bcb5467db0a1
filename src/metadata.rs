//! Injectable markers and inject overrides.
//!
//! This is the annotation surface: applications call [`mark_injectable`] and
//! [`record_inject_override`] at declaration time, before any module
//! referencing the type is registered. Auto-registration reads these side
//! tables during resolution and refuses to build unmarked types.

use crate::token::Token;
use dashmap::{DashMap, DashSet};
use std::any::TypeId;
use std::sync::LazyLock;

static INJECTABLE: LazyLock<DashSet<TypeId>> = LazyLock::new(DashSet::new);
static OVERRIDES: LazyLock<DashMap<TypeId, Vec<InjectOverride>>> = LazyLock::new(DashMap::new);

/// Explicit token substituted for one constructor parameter of one type.
///
/// Overrides apply only to auto-registration of the type they are recorded
/// for; other types depending on the same parameter type are unaffected.
#[derive(Clone, Debug)]
pub struct InjectOverride {
    pub parameter_index: usize,
    pub token: Token,
}

/// Mark a type as injectable. Idempotent.
pub fn mark_injectable<T: 'static>() {
    INJECTABLE.insert(TypeId::of::<T>());
}

/// Whether a type carries the injectable marker.
pub fn is_injectable<T: 'static>() -> bool {
    is_injectable_id(TypeId::of::<T>())
}

pub(crate) fn is_injectable_id(id: TypeId) -> bool {
    INJECTABLE.contains(&id)
}

/// Record an explicit token for one constructor parameter of `T`.
///
/// Records accumulate in call order with no de-duplication by index; when
/// applied they are folded left to right, so the later of two records for
/// the same index wins.
pub fn record_inject_override<T: 'static>(parameter_index: usize, token: impl Into<Token>) {
    OVERRIDES
        .entry(TypeId::of::<T>())
        .or_default()
        .push(InjectOverride {
            parameter_index,
            token: token.into(),
        });
}

/// Accumulated override records for `T`, in registration order.
pub fn inject_overrides<T: 'static>() -> Vec<InjectOverride> {
    overrides_for(TypeId::of::<T>())
}

pub(crate) fn overrides_for(id: TypeId) -> Vec<InjectOverride> {
    OVERRIDES
        .get(&id)
        .map(|records| records.value().clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unmarked;
    struct Marked;
    struct Overridden;

    #[test]
    fn unmarked_types_are_not_injectable() {
        assert!(!is_injectable::<Unmarked>());
    }

    #[test]
    fn marking_is_idempotent() {
        mark_injectable::<Marked>();
        mark_injectable::<Marked>();
        assert!(is_injectable::<Marked>());
    }

    #[test]
    fn overrides_accumulate_in_call_order() {
        record_inject_override::<Overridden>(0, "FIRST");
        record_inject_override::<Overridden>(1, "SECOND");
        record_inject_override::<Overridden>(0, "THIRD");

        let records = inject_overrides::<Overridden>();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].token, Token::named("FIRST"));
        assert_eq!(records[2].token, Token::named("THIRD"));
    }

    #[test]
    fn types_without_records_yield_empty() {
        assert!(inject_overrides::<Unmarked>().is_empty());
    }
}
