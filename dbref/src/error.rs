use thiserror::Error;

/// Errors the flag engine reports to the actor. Message text is exact —
/// downstream callers surface `Display` directly to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// `set flag` with no flag name given.
    #[error("You must specify a flag to set.")]
    MustSpecifyToSet,

    /// `clear flag` with no flag name given.
    #[error("You must specify a flag to clear.")]
    MustSpecifyToClear,

    /// The name or letter does not resolve to any registered flag.
    #[error("I do not understand that flag.")]
    UnknownFlag,

    /// `convert_flags` saw two different object-type letters.
    #[error("You can't set multiple object types.")]
    ConflictingType,

    /// The actor is not permitted to see (and therefore not permitted to
    /// set via letter-string) this flag.
    #[error("I do not understand that flag.")]
    NotVisible,

    /// A handler refused the mutation (permission denied). `reason` is
    /// `None` for the generic case (no distinct message beyond silence,
    /// handled by the caller) and `Some` for handlers with a specific
    /// user-visible refusal string.
    #[error("Permission denied.")]
    PermissionDenied,

    /// `fh_any` refusing to let God drop the WIZARD bit on themselves.
    #[error("You cannot make God mortal.")]
    CannotMakeGodMortal,

    /// Attempted to reassign the handler of a flag whose current handler
    /// is not one of the reassignable kinds.
    #[error("That flag's handler cannot be reassigned.")]
    HandlerNotReassignable,
}
