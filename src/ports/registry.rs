use async_trait::async_trait;

use crate::domain::command::CommandSpec;

/// The command-registry collaborator. The registry owns the mapping from
/// command id to specification; registering replaces any existing spec
/// with the same id, and unregistering an absent id is a no-op.
#[async_trait]
pub trait CommandRegistryPort: Send + Sync {
    async fn register(&self, spec: CommandSpec);

    async fn unregister(&self, command_id: &str);
}
