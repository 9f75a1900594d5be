use async_trait::async_trait;

use crate::{Result, runtime::NodeContext};

/// Executes the work behind a node, typically a call into a deploy provider.
///
/// Implementations report progress through [`NodeContext::emit`]. Returning an
/// error fails the node: the error is recorded on its log entry and none of
/// its descendants run.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(
        &self,
        ctx: &NodeContext,
    ) -> Result<()>;
}
