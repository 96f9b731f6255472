use eigen_core::Interned;

use crate::heap::ObjectRef;
use crate::value::Value;

/// What a frame is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// A method found by resolution.
    Method,
    /// A missing-method handler.
    MissingHandler,
}

/// Represents the activation of a method (or of a missing-method handler).
#[derive(Debug, Clone)]
pub struct Frame {
    /// The class, module or eigenclass holding the running method.
    pub holder: ObjectRef,
    /// The name the method was invoked with.
    pub signature: Interned,
    /// The receiver.
    pub self_value: Value,
    /// Whether a method or a missing-method handler is running.
    pub kind: FrameKind,
}

impl Frame {
    /// Construct a new frame.
    pub fn new(holder: ObjectRef, signature: Interned, self_value: Value) -> Self {
        Self {
            holder,
            signature,
            self_value,
            kind: FrameKind::Method,
        }
    }

    /// Construct a frame for a missing-method handler held by `holder`.
    pub fn missing(holder: ObjectRef, signature: Interned, self_value: Value) -> Self {
        Self {
            kind: FrameKind::MissingHandler,
            ..Self::new(holder, signature, self_value)
        }
    }

    /// Get the self value for this frame.
    pub fn get_self(&self) -> Value {
        self.self_value.clone()
    }
}
