use tokio::sync::watch;

/// Caller-held handle that aborts a pending operation.
///
/// Created in a pair with the [`CancelToken`] passed into the operation.
/// Dropping the source without firing it never cancels anything.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    /// Create a linked source/token pair
    pub fn new() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelToken { rx: Some(rx) })
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cooperative cancellation signal observed by pending operations
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelToken {
    /// A token that can never fire, for callers that opt out of cancellation
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested; pends forever on a
    /// never-token or when the source is dropped unfired.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return futures::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Source dropped without firing
                return futures::future::pending().await;
            }
        }
    }
}
