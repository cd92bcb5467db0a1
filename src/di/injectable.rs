use crate::di::provider::ResolvedArguments;
use crate::error::Result;
use crate::token::Token;

/// The construction seam for auto-registered types.
///
/// Rust cannot introspect constructor parameter types at runtime, so an
/// injectable type declares its ordered dependency manifest itself:
/// [`dependencies`](Injectable::dependencies) lists the tokens in declaration
/// order, and [`assemble`](Injectable::assemble) consumes the resolved values
/// in the same order. The manifest must be stable across calls.
///
/// Implementing this trait does not make the type injectable on its own;
/// that is a separate declaration step via
/// [`crate::metadata::mark_injectable`], and the container refuses to build
/// unmarked types.
///
/// # Example
/// ```rust,ignore
/// struct UserService {
///     repository: Arc<UserRepository>,
/// }
///
/// impl Injectable for UserService {
///     fn dependencies() -> Vec<Token> {
///         vec![Token::of::<UserRepository>()]
///     }
///
///     fn assemble(args: &mut ResolvedArguments) -> Result<Self> {
///         Ok(Self { repository: args.take()? })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Ordered constructor dependency tokens, as declared.
    fn dependencies() -> Vec<Token> {
        Vec::new()
    }

    /// Build from the resolved dependencies, in declaration order.
    fn assemble(args: &mut ResolvedArguments) -> Result<Self>;
}
