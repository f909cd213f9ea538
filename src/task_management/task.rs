//! # Task System Core Traits
//!
//! A [`Task`] is a self-contained unit of work shipped to a worker thread. It
//! owns everything it reads, so the thread that created it can keep mutating
//! its own state while the task runs.
//!
//! ## Task Lifecycle
//! 1. The owner builds a task and hands it to an idle worker with
//!    [`WorkerPool::dispatch`](super::WorkerPool::dispatch)
//! 2. The worker thread calls [`Task::process`] with its private context
//! 3. The output travels back over the worker's result channel
//! 4. The owner collects it with [`WorkerPool::take_done`](super::WorkerPool::take_done)
//!
//! ## Thread Safety
//! - Tasks and their outputs must be `Send` to cross threads
//! - The per-worker context never leaves its thread after construction

/// A unit of work executed on a worker thread.
///
/// # Implementation Guidelines
/// - Own all input data; never borrow state the dispatching thread mutates
/// - Keep the output small enough to merge quickly on the dispatching thread
pub trait Task: Send + 'static {
    /// Per-worker state reused between tasks, such as scratch buffers.
    type Context: Send + 'static;

    /// What the task hands back to the dispatching thread.
    type Output: Send + 'static;

    /// Runs the task.
    ///
    /// # Arguments
    /// * `context` - The executing worker's private state
    ///
    /// # Returns
    /// The output to send back to the dispatching thread
    fn process(self, context: &mut Self::Context) -> Self::Output;
}
