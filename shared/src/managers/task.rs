use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{self, Receiver},
};

type Outcome<T> = Result<T, Box<dyn Any + Send>>;

/// Work running on the rayon pool, joined with `wait`.
pub(crate) struct Task<T> {
    receiver: Receiver<Outcome<T>>,
}

impl<T: Send + 'static> Task<T> {
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        rayon::spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(work));
            let _ = sender.send(outcome);
        });
        Self { receiver }
    }

    /// Blocks until the work finished. A panic inside the work is re-raised
    /// on the caller.
    pub fn wait(self) -> T {
        match self.receiver.recv() {
            Ok(Ok(value)) => value,
            Ok(Err(payload)) => panic::resume_unwind(payload),
            // the sender always sends before it drops
            Err(_) => panic!("task dropped without finishing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_returns_the_result() {
        let tasks: Vec<Task<usize>> = (0..64).map(|i| Task::spawn(move || i * 2)).collect();
        let total: usize = tasks.into_iter().map(Task::wait).sum();
        assert_eq!(total, (0..64).map(|i| i * 2).sum());
    }

    #[test]
    fn panic_reaches_the_waiter() {
        let task = Task::spawn(|| -> u32 { panic!("checksum failed") });
        let result = panic::catch_unwind(AssertUnwindSafe(|| task.wait()));
        assert!(result.is_err());
    }
}
