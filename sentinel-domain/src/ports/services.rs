use async_trait::async_trait;

#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Fire-and-forget delivery; never blocks the caller on the network.
    fn spawn_notify(&self, reports: Vec<String>);
    async fn check_target(&self) -> anyhow::Result<()>;
    fn mode(&self) -> &'static str;

    /// Waits for deliveries started by `spawn_notify` to settle.
    async fn flush(&self) {}
}
