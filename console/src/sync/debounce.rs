//! Debouncing of rapidly changing input

use std::time::Duration;

use tokio::sync::mpsc;

/// Quiet period before typed search text becomes a filter
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Input side of a debounced stream
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Submit a value. Only the last value of a burst is emitted.
    pub fn push(&self, value: T) {
        let _ = self.tx.send(value);
    }
}

/// Spawn a debouncer. The receiver yields a value once no newer value has
/// been pushed for `delay`. A pending value is flushed when every
/// [`Debouncer`] handle is dropped.
pub fn debounce<T: Send + 'static>(delay: Duration) -> (Debouncer<T>, mpsc::UnboundedReceiver<T>) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(delay, in_rx, out_tx));
    (Debouncer { tx: in_tx }, out_rx)
}

async fn run<T>(
    delay: Duration,
    mut input: mpsc::UnboundedReceiver<T>,
    output: mpsc::UnboundedSender<T>,
) {
    while let Some(mut pending) = input.recv().await {
        loop {
            match tokio::time::timeout(delay, input.recv()).await {
                Ok(Some(value)) => pending = value,
                Ok(None) => {
                    let _ = output.send(pending);
                    return;
                }
                Err(_) => {
                    if output.send(pending).is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}
