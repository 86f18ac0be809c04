/// Serialization primitives for asynchronous transitions
///
/// - `SyncQueue`: named FIFO queues, one operation in flight per name
/// - `Completion`: the exactly-once callback policies complete with
pub mod completion;
pub mod queue;

pub use completion::Completion;
pub use queue::{OperationId, SyncQueue};
