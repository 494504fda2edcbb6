//! Error types for synthesis and the bindable runtime.
//!
//! Build-time failures ([`SynthError`]) are fatal to the build call that
//! raised them and are never cached; instantiation and invocation failures
//! ([`RuntimeError`]) are local to the call that raised them.

/// Result type for synthesis (build-time) operations
pub type SynthResult<T> = Result<T, SynthError>;

/// Build-time synthesis errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthError {
    /// The prototype cannot be synthesized from
    #[error("Invalid prototype '{prototype}': {reason}")]
    InvalidPrototype {
        /// Prototype name
        prototype: String,
        /// Why the prototype was rejected
        reason: String,
    },

    /// The prototype implements the notification channel concretely but
    /// exposes no reusable raiser method
    #[error("Prototype '{prototype}' implements the notification channel but has no reusable raiser method")]
    MissingNotifierMethod {
        /// Prototype name
        prototype: String,
    },

    /// The interface closure yields two incompatible declarations for one
    /// member signature
    #[error("Ambiguous member '{member}' in the closure of prototype '{prototype}'")]
    AmbiguousMember {
        /// Prototype name
        prototype: String,
        /// Conflicting member signature
        member: String,
    },

    /// No prototype registered under this name
    #[error("Unknown prototype: {name}")]
    UnknownPrototype {
        /// Requested prototype name
        name: String,
    },
}

/// Result type for runtime (instantiation/invocation) operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Runtime errors raised by synthesized instances
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// A stub member was invoked
    #[error("Not implemented: {member}")]
    NotImplemented {
        /// The stub member's name
        member: String,
    },

    /// No constructor accepts the supplied arguments
    #[error("No constructor of '{class}' accepts the supplied {arity} argument(s)")]
    MissingConstructor {
        /// Synthesized class name
        class: String,
        /// Number of arguments supplied
        arity: usize,
    },

    /// The best-matching constructor is not accessible to the caller
    #[error("Constructor of '{class}' is not accessible to the caller")]
    AccessDenied {
        /// Synthesized class name
        class: String,
    },

    /// No member with this name on the synthesized class
    #[error("Unknown member '{member}' on '{class}'")]
    UnknownMember {
        /// Synthesized class name
        class: String,
        /// Requested member name
        member: String,
    },

    /// A value was not assignable to the member's declared type
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Write attempted on a get-only property
    #[error("Property '{property}' is read-only")]
    ReadOnlyProperty {
        /// Property name
        property: String,
    },

    /// A member referenced a function id missing from the registry
    #[error("Unknown function id: {id}")]
    UnknownFunction {
        /// The unresolved function id
        id: usize,
    },

    /// Field index outside the instance's field vector
    #[error("Field index {index} out of bounds ({len} fields)")]
    FieldOutOfBounds {
        /// Requested index
        index: usize,
        /// Number of fields
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SynthError::InvalidPrototype {
            prototype: "Widget".to_string(),
            reason: "sealed".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid prototype 'Widget': sealed");

        let err = RuntimeError::MissingConstructor {
            class: "Widget$Bindable".to_string(),
            arity: 3,
        };
        assert!(err.to_string().contains("3 argument(s)"));
    }
}
