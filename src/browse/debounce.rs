use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Collapses bursts of values: a value is only published once no newer one
/// has arrived for `delay`.
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    settled: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn new(delay: Duration) -> Self {
        let (input, rx) = mpsc::unbounded_channel();
        let (tx, settled) = watch::channel(None);
        let task = tokio::spawn(settle(rx, tx, delay));

        Self {
            input,
            settled,
            task,
        }
    }

    pub fn push(&self, value: T) {
        let _ = self.input.send(value);
    }

    /// Last settled value, if any.
    pub fn latest(&self) -> Option<T> {
        self.settled.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.settled.clone()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn settle<T: PartialEq>(
    mut input: mpsc::UnboundedReceiver<T>,
    settled: watch::Sender<Option<T>>,
    delay: Duration,
) {
    let publish = |value: T| {
        settled.send_if_modified(|current| {
            if current.as_ref() == Some(&value) {
                return false;
            }
            *current = Some(value);
            true
        });
    };

    let mut pending: Option<T> = None;

    loop {
        match pending.take() {
            None => match input.recv().await {
                Some(value) => pending = Some(value),
                None => break,
            },
            Some(value) => {
                tokio::select! {
                    newer = input.recv() => match newer {
                        Some(newer) => pending = Some(newer),
                        None => {
                            publish(value);
                            break;
                        }
                    },
                    _ = tokio::time::sleep(delay) => publish(value),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_value() {
        let debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.push("c".to_string());
        debouncer.push("co".to_string());
        debouncer.push("con".to_string());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(debouncer.latest(), None);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(debouncer.latest(), Some("con".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_pause_resets_timer() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let mut rx = debouncer.subscribe();

        debouncer.push(1u32);
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.push(2);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(debouncer.latest(), None);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(2));
    }
}
