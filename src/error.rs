use crate::arena::BodyHandle;

/// Errors raised by the attachment surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The attachment target does not resolve to a live body.
    #[error("attachment target {0:?} is not a live body")]
    InvalidTarget(BodyHandle),

    /// The body kind has no attach point with the requested name.
    #[error("{kind} has no attach point named '{part}'")]
    UnknownAttachPoint { kind: &'static str, part: String },

    /// Following the target's attachment chain leads back to the body.
    #[error("attaching {body:?} to {target:?} would form an attachment cycle")]
    CyclicAttachment { body: BodyHandle, target: BodyHandle },

    /// The body being operated on is stale or was never issued.
    #[error("body {0:?} is not a live body")]
    UnknownBody(BodyHandle),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
