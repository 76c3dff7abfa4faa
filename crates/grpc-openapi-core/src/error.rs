//! Annotation decoding errors raised at the descriptor-graph boundary.

use crate::options::Slot;

/// A misconfigured annotation in the source schema.
///
/// Any of these aborts registry construction: the generator never guesses
/// around an annotation whose shape does not match its extension slot.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AnnotationError {
    /// The payload type does not match the message type of its slot.
    #[error(
        "{element}: you have added an extension of type {found} to the '{slot}' slot, \
         but only extensions of type {expected} are allowed"
    )]
    WrongType {
        /// Element the annotation is attached to.
        element: String,
        /// Slot the annotation was attached through.
        slot: Slot,
        /// Type URL the slot expects.
        expected: String,
        /// Type URL found on the payload.
        found: String,
    },

    /// The slot does not exist on this kind of element.
    #[error("{element}: the '{slot}' annotation cannot be attached to a {kind}")]
    UnsupportedSlot {
        /// Element the annotation is attached to.
        element: String,
        /// Offending slot.
        slot: Slot,
        /// Element kind (e.g. `field`, `service`).
        kind: &'static str,
    },

    /// The same slot is attached twice to one element.
    #[error("{element}: the '{slot}' annotation is attached more than once")]
    Duplicate {
        /// Element the annotation is attached to.
        element: String,
        /// Repeated slot.
        slot: Slot,
    },

    /// The payload bytes do not decode as the slot's message type.
    #[error("{element}: failed to decode '{slot}' annotation: {source}")]
    Decode {
        /// Element the annotation is attached to.
        element: String,
        /// Slot being decoded.
        slot: Slot,
        /// Underlying prost error.
        #[source]
        source: prost::DecodeError,
    },
}
