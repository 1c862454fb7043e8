/// Anything that identifies one input/output tensor slot of an inference graph.
pub trait TensorIndex {
    fn index(&self) -> i32;
}

impl TensorIndex for i32 {
    fn index(&self) -> i32 {
        *self
    }
}

/// A bare tensor slot reference, for callers that only track indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorRef(pub i32);

impl TensorIndex for TensorRef {
    fn index(&self) -> i32 {
        self.0
    }
}
