// Application Layer - Use Cases

pub mod retrieval;

// Re-exports
pub use retrieval::{
    ExecutionMode, RetrievalEngine, RetrievalError, RetrievalOutcome, RetrievalRequest,
};
