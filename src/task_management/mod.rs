//! # Worker Pool
//!
//! A fixed set of long-lived worker threads, each with exactly one work slot.
//! The dispatching thread never blocks on a worker: it hands work only to idle
//! workers and polls for results without waiting.
//!
//! ## Architecture Overview
//! - Every worker owns a task channel (dispatcher → worker) and a result
//!   channel (worker → dispatcher)
//! - At most [`MAX_TASKS_IN_FLIGHT`] task is outstanding per worker, which
//!   makes the worker's slot its only piece of shared state
//! - Each worker thread keeps a private [`Task::Context`] for its whole life
//!
//! ## Worker States
//! ```text
//!   Idle --dispatch--> Busy --(thread finishes, poll)--> Done --take_done--> Idle
//! ```
//! The dispatcher performs every transition; the worker thread only signals
//! completion by sending its result.
//!
//! ## Lost Workers
//! A worker whose task panics takes its thread down with it. [`WorkerPool::poll`]
//! notices the closed result channel, reports the worker index so the owner can
//! recover the lost task, and starts a replacement thread with a fresh context.
//!
//! ## Shutdown
//! Dropping the pool closes every task channel, which ends the worker loops,
//! and then joins the threads. A task still running finishes first.

pub mod task;

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use log::{info, warn};

use crate::error::{Result, StreamError};

use task::Task;

/// Maximum number of tasks in flight per worker.
///
/// One task per worker keeps the handshake a plain three-state machine and
/// lets the dispatcher know exactly which work each worker holds.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

/// Where a worker is in its handshake with the dispatcher.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for work.
    Idle,
    /// Processing a task.
    Busy,
    /// Finished; the output waits to be taken.
    Done,
}

/// One worker thread and its channels.
///
/// # Fields
/// - `task_sender`: Sends tasks to the thread; `None` once shutdown started
/// - `result_receiver`: Receives outputs from the thread
/// - `num_tasks_in_flight`: Tasks sent and not yet received back
/// - `finished`: Output received but not yet taken
/// - `disconnected`: The thread stopped answering
/// - `worker`: Handle used to join the thread on drop
struct TaskChannel<T: Task> {
    state: WorkerState,
    task_sender: Option<Sender<T>>,
    result_receiver: Receiver<T::Output>,
    num_tasks_in_flight: usize,
    finished: Option<T::Output>,
    disconnected: bool,
    worker: Option<JoinHandle<()>>,
}

/// Builds the private context of worker `index`.
type ContextFactory<C> = Box<dyn FnMut(usize) -> C + Send>;

/// Fixed pool of worker threads with one work slot each.
pub struct WorkerPool<T: Task> {
    channels: Vec<TaskChannel<T>>,
    make_context: ContextFactory<T::Context>,
}

impl<T: Task> TaskChannel<T> {
    /// Starts worker thread `index` around `context`.
    fn spawn(index: usize, mut context: T::Context) -> Result<Self> {
        let (task_tx, task_rx) = channel::<T>();
        let (result_tx, result_rx) = channel::<T::Output>();

        let task_closure = move || {
            while let Ok(task) = task_rx.recv() {
                let output = task.process(&mut context);
                if result_tx.send(output).is_err() {
                    break;
                }
            }
        };

        let worker = thread::Builder::new()
            .name(format!("chunk-worker-{index}"))
            .spawn(task_closure)
            .map_err(|source| StreamError::WorkerSpawn { index, source })?;

        Ok(TaskChannel {
            state: WorkerState::Idle,
            task_sender: Some(task_tx),
            result_receiver: result_rx,
            num_tasks_in_flight: 0,
            finished: None,
            disconnected: false,
            worker: Some(worker),
        })
    }
}

impl<T: Task> WorkerPool<T> {
    /// Starts `num_workers` worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of threads to start
    /// * `make_context` - Builds the private context of worker `index`
    ///
    /// # Returns
    /// The pool, or [`StreamError::WorkerSpawn`] if a thread could not be
    /// started. Threads started before the failure are shut down again.
    pub fn new(
        num_workers: usize,
        make_context: impl FnMut(usize) -> T::Context + Send + 'static,
    ) -> Result<Self> {
        let mut pool = WorkerPool {
            channels: Vec::with_capacity(num_workers),
            make_context: Box::new(make_context),
        };

        for index in 0..num_workers {
            let context = (pool.make_context)(index);
            pool.channels.push(TaskChannel::spawn(index, context)?);
        }

        info!(
            "Started {} chunk workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );
        Ok(pool)
    }

    /// Number of workers.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns `true` for a pool without workers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// State of worker `index`, or `None` if there is no such worker.
    pub fn state(&self, index: usize) -> Option<WorkerState> {
        self.channels.get(index).map(|channel| channel.state)
    }

    /// Returns `true` if worker `index` can take a task right now.
    pub fn is_idle(&self, index: usize) -> bool {
        self.channels.get(index).is_some_and(|channel| {
            channel.state == WorkerState::Idle
                && !channel.disconnected
                && channel.num_tasks_in_flight < MAX_TASKS_IN_FLIGHT
        })
    }

    /// Hands a task to an idle worker (Idle → Busy).
    ///
    /// # Returns
    /// - `Ok(())` if the worker accepted the task
    /// - `Err(task)` if the worker is not idle or its thread is gone
    pub fn dispatch(&mut self, index: usize, task: T) -> std::result::Result<(), T> {
        if !self.is_idle(index) {
            return Err(task);
        }
        let channel = &mut self.channels[index];
        let Some(sender) = channel.task_sender.as_ref() else {
            return Err(task);
        };
        match sender.send(task) {
            Ok(()) => {
                channel.num_tasks_in_flight += 1;
                channel.state = WorkerState::Busy;
                Ok(())
            }
            Err(returned) => {
                warn!("Chunk worker {index} stopped accepting work");
                channel.disconnected = true;
                Err(returned.0)
            }
        }
    }

    /// Checks every busy worker for a finished task (Busy → Done).
    ///
    /// Never blocks.
    ///
    /// # Returns
    /// The workers whose thread died with a task in flight. Their task is gone;
    /// each such worker is restarted with a fresh context and comes back Idle.
    pub fn poll(&mut self) -> Vec<usize> {
        let mut lost = Vec::new();
        for (index, channel) in self.channels.iter_mut().enumerate() {
            if channel.state != WorkerState::Busy {
                continue;
            }
            match channel.result_receiver.try_recv() {
                Ok(output) => {
                    channel.num_tasks_in_flight -= 1;
                    channel.finished = Some(output);
                    channel.state = WorkerState::Done;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    if !channel.disconnected {
                        warn!("Chunk worker {index} exited with a task in flight");
                        channel.disconnected = true;
                        lost.push(index);
                    }
                }
            }
        }
        for &index in &lost {
            self.restart(index);
        }
        lost
    }

    /// Replaces the dead thread of worker `index`.
    ///
    /// If no new thread can be started the worker stays disconnected and is
    /// never idle again.
    fn restart(&mut self, index: usize) {
        let context = (self.make_context)(index);
        let replacement = match TaskChannel::spawn(index, context) {
            Ok(replacement) => replacement,
            Err(err) => {
                warn!("Could not restart chunk worker {index}: {err}");
                return;
            }
        };
        let mut old = std::mem::replace(&mut self.channels[index], replacement);
        if let Some(worker) = old.worker.take() {
            if worker.join().is_err() {
                warn!("Chunk worker {index} panicked");
            }
        }
        info!("Restarted chunk worker {index}");
    }

    /// Takes the output of a finished worker (Done → Idle).
    pub fn take_done(&mut self, index: usize) -> Option<T::Output> {
        let channel = self.channels.get_mut(index)?;
        if channel.state != WorkerState::Done {
            return None;
        }
        channel.state = WorkerState::Idle;
        channel.finished.take()
    }
}

impl<T: Task> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        for channel in &mut self.channels {
            channel.task_sender = None;
        }
        for (index, channel) in self.channels.iter_mut().enumerate() {
            if let Some(worker) = channel.worker.take() {
                if worker.join().is_err() {
                    warn!("Chunk worker {index} panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct Square(u64);

    impl Task for Square {
        type Context = u64;
        type Output = (u64, u64);

        fn process(self, calls: &mut u64) -> (u64, u64) {
            *calls += 1;
            (self.0 * self.0, *calls)
        }
    }

    /// Panics on the worker thread when asked to.
    struct Fragile(bool);

    impl Task for Fragile {
        type Context = u64;
        type Output = u64;

        fn process(self, calls: &mut u64) -> u64 {
            assert!(!self.0, "fragile task failed");
            *calls += 1;
            *calls
        }
    }

    fn wait_done(pool: &mut WorkerPool<Square>, index: usize) -> (u64, u64) {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            pool.poll();
            if let Some(output) = pool.take_done(index) {
                return output;
            }
            assert!(Instant::now() < deadline, "worker {index} never finished");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn workers_walk_the_handshake() {
        let mut pool = WorkerPool::<Square>::new(2, |_| 0).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.state(0), Some(WorkerState::Idle));
        assert!(pool.dispatch(0, Square(7)).is_ok());
        assert_eq!(pool.state(0), Some(WorkerState::Busy));
        assert!(!pool.is_idle(0));

        let deadline = Instant::now() + Duration::from_secs(10);
        while pool.state(0) != Some(WorkerState::Done) {
            pool.poll();
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(pool.take_done(0), Some((49, 1)));
        assert_eq!(pool.state(0), Some(WorkerState::Idle));
        assert_eq!(pool.take_done(0), None);
    }

    #[test]
    fn busy_workers_refuse_more_work() {
        let mut pool = WorkerPool::<Square>::new(1, |_| 0).unwrap();
        assert!(pool.dispatch(0, Square(2)).is_ok());
        match pool.dispatch(0, Square(3)) {
            Err(Square(3)) => {}
            _ => panic!("second task should be handed back"),
        }
        assert_eq!(wait_done(&mut pool, 0), (4, 1));
    }

    #[test]
    fn contexts_persist_per_worker() {
        let mut pool = WorkerPool::<Square>::new(2, |index| index as u64 * 100).unwrap();
        for n in 1..=3 {
            pool.dispatch(1, Square(n)).ok();
            assert_eq!(wait_done(&mut pool, 1), (n * n, 100 + n));
        }
        pool.dispatch(0, Square(5)).ok();
        assert_eq!(wait_done(&mut pool, 0), (25, 1));
    }

    #[test]
    fn dead_workers_are_reported_and_restarted() {
        let mut pool = WorkerPool::<Fragile>::new(2, |_| 0).unwrap();
        assert!(pool.dispatch(1, Fragile(false)).is_ok());
        let deadline = Instant::now() + Duration::from_secs(10);
        while pool.take_done(1).is_none() {
            assert!(pool.poll().is_empty());
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(1));
        }

        assert!(pool.dispatch(1, Fragile(true)).is_ok());
        let lost = loop {
            let lost = pool.poll();
            if !lost.is_empty() {
                break lost;
            }
            assert!(Instant::now() < deadline, "lost worker never reported");
            thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(lost, vec![1]);
        assert_eq!(pool.state(1), Some(WorkerState::Idle));
        assert!(pool.is_idle(1));

        // the replacement starts from a fresh context
        assert!(pool.dispatch(1, Fragile(false)).is_ok());
        loop {
            pool.poll();
            if let Some(calls) = pool.take_done(1) {
                assert_eq!(calls, 1);
                break;
            }
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn unknown_workers_are_never_idle() {
        let mut pool = WorkerPool::<Square>::new(1, |_| 0).unwrap();
        assert_eq!(pool.state(3), None);
        assert!(pool.dispatch(3, Square(1)).is_err());
        assert_eq!(pool.take_done(3), None);
    }
}
