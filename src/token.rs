use std::any::{TypeId, type_name};
use std::fmt;

/// Key identifying a registrable dependency.
///
/// A token is either a type reference (identity is the `TypeId`, so two
/// distinct types never collide even when their short names match) or a
/// literal string, used by dynamic modules and explicit provider
/// descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// A concrete type, keyed by its `TypeId`.
    Type {
        id: TypeId,
        name: &'static str,
    },
    /// A literal string key.
    Named(String),
}

impl Token {
    /// Token for a concrete type.
    pub fn of<T: 'static>() -> Self {
        Token::Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Token for a string key.
    pub fn named(name: impl Into<String>) -> Self {
        Token::Named(name.into())
    }

    /// Name used in error messages: the type path or the literal string.
    pub fn display_name(&self) -> &str {
        match self {
            Token::Type { name, .. } => name,
            Token::Named(name) => name,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl From<&str> for Token {
    fn from(name: &str) -> Self {
        Token::named(name)
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::named(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    struct Beta;

    #[test]
    fn type_tokens_are_distinct_per_type() {
        assert_eq!(Token::of::<Alpha>(), Token::of::<Alpha>());
        assert_ne!(Token::of::<Alpha>(), Token::of::<Beta>());
    }

    #[test]
    fn named_tokens_compare_by_value() {
        assert_eq!(Token::named("CFG"), Token::from("CFG"));
        assert_ne!(Token::named("CFG"), Token::named("ENV"));
    }

    #[test]
    fn display_uses_the_literal_for_named_tokens() {
        assert_eq!(Token::named("ENV_KEY").to_string(), "ENV_KEY");
    }
}
