use anyhow::Result;
use async_trait::async_trait;

use crate::context::TickContext;

/// One periodic job. Every tick it queries its candidates, skips anything
/// already acted on, re-validates preconditions, applies its guarded
/// transition (if it has one), and only then notifies.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &'static str;

    /// Run one tick. An error here aborts only this task's tick, never the
    /// whole scheduler; per-candidate failures are handled inside.
    async fn tick(&self, ctx: &TickContext) -> Result<()>;
}
