//! Bounded task queue for remote work.

use std::future::Future;

use futures::stream::{self, StreamExt};

use crate::error::Result;

/// Runs async tasks with at most `limit` in flight, yielding results in
/// submission order.
#[derive(Debug, Clone, Copy)]
pub struct TaskQueue {
    limit: usize,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self { limit: 1 }
    }
}

impl TaskQueue {
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `task` over `items`.
    ///
    /// `on_done` is called with each result's index, in order. The first
    /// error from either a task or `on_done` stops the queue; tasks still in
    /// flight are dropped.
    pub async fn run<T, R, F, Fut, D>(&self, items: Vec<T>, task: F, mut on_done: D) -> Result<Vec<R>>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<R>>,
        D: FnMut(usize, &R) -> Result<()>,
    {
        let mut results = Vec::with_capacity(items.len());
        let mut pending = stream::iter(items).map(task).buffered(self.limit);

        while let Some(result) = pending.next().await {
            let value = result?;
            on_done(results.len(), &value)?;
            results.push(value);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_results_in_submission_order() {
        let queue = TaskQueue::new(3);
        let out = queue
            .run(
                vec![3usize, 0, 2, 1],
                |yields| async move {
                    for _ in 0..yields {
                        tokio::task::yield_now().await;
                    }
                    Ok(yields * 10)
                },
                |_, _| Ok(()),
            )
            .await
            .unwrap();
        assert_eq!(out, vec![30, 0, 20, 10]);
    }

    #[tokio::test]
    async fn test_limit_bounds_in_flight_tasks() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let queue = TaskQueue::new(2);
        queue
            .run(
                (0..6).collect::<Vec<_>>(),
                |i| {
                    let (in_flight, peak) = (&in_flight, &peak);
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(i)
                    }
                },
                |_, _| Ok(()),
            )
            .await
            .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_default_runs_one_at_a_time() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        TaskQueue::default()
            .run(
                vec![(); 4],
                |_| {
                    let (in_flight, peak) = (&in_flight, &peak);
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                |_, _| Ok(()),
            )
            .await
            .unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_failure_stops_queue() {
        let started = Mutex::new(Vec::new());
        let done = Mutex::new(Vec::new());

        let err = TaskQueue::new(1)
            .run(
                vec![0, 1, 2, 3],
                |i| {
                    started.lock().unwrap().push(i);
                    async move {
                        if i == 1 {
                            Err(Error::UploadFailed("boom".to_string()))
                        } else {
                            Ok(i)
                        }
                    }
                },
                |index, _| {
                    done.lock().unwrap().push(index);
                    Ok(())
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UploadFailed);
        assert_eq!(*done.lock().unwrap(), vec![0]);
        assert!(!started.lock().unwrap().contains(&3));
    }

    #[test]
    fn test_zero_limit_means_one() {
        assert_eq!(TaskQueue::new(0).limit(), 1);
    }
}
