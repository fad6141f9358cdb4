use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Fan-out of page paths whose cached rendering is stale.
///
/// Handlers signal after a successful write; page caches and CDN purgers subscribe.
/// Sending with no subscribers is not an error, and lagging subscribers lose old paths.
#[derive(Clone)]
pub struct Revalidator {
    sender: broadcast::Sender<String>,
}

impl Default for Revalidator {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl Revalidator {
    pub fn revalidate(&self, path: impl Into<String>) {
        let path = path.into();
        let receivers = self.sender.send(path.clone()).unwrap_or(0);
        tracing::debug!("Revalidate {} ({} subscribers)", path, receivers);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}
