use async_trait::async_trait;

/// The outbound chat collaborator. Fire-and-forget: no delivery
/// confirmation is relied upon, so sends are infallible at this boundary.
#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Sends `message`, whispered to `target` when given, broadcast
    /// otherwise.
    async fn send(&self, message: &str, target: Option<&str>);
}
