//! The tick loop: one tokio interval driving every registered task, with a
//! watch-channel shutdown. One task's failure never aborts the tick, and a
//! failed tick never stops the loop.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::context::TickContext;
use crate::delay::DelayQueue;
use crate::task::PeriodicTask;
use crate::tasks::{
    AppealButtonTask, AppealExpiryTask, LateStrikeTask, NoVideoTask, PreIntakeTask,
    ReshootExpiryTask, ReviewExpiryTask, TopicCleanupTask,
};

pub struct Scheduler {
    ctx: Arc<TickContext>,
    tasks: Vec<Box<dyn PeriodicTask>>,
}

impl Scheduler {
    pub fn new(ctx: Arc<TickContext>) -> Self {
        Self { ctx, tasks: Vec::new() }
    }

    /// The full catalogue, in deadline order: reminder first, then the
    /// escalating removals, then the appeal windows, then housekeeping.
    pub fn with_standard_tasks(ctx: Arc<TickContext>, delay: Arc<DelayQueue>) -> Self {
        let mut scheduler = Self::new(ctx);
        scheduler
            .register(PreIntakeTask::new(delay))
            .register(LateStrikeTask)
            .register(NoVideoTask)
            .register(ReviewExpiryTask)
            .register(ReshootExpiryTask)
            .register(AppealExpiryTask)
            .register(AppealButtonTask)
            .register(TopicCleanupTask);
        scheduler
    }

    pub fn register<T: PeriodicTask + 'static>(&mut self, task: T) -> &mut Self {
        self.tasks.push(Box::new(task));
        self
    }

    /// Run every task once against the current clock.
    pub async fn tick_once(&self) {
        for task in &self.tasks {
            debug!(task = task.name(), "Tick");
            if let Err(e) = task.tick(&self.ctx).await {
                error!(task = task.name(), error = %e, "Task tick failed");
            }
        }
    }

    /// Tick on the configured interval until the shutdown channel flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.ctx.cfg.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            interval_secs = self.ctx.cfg.tick_interval.as_secs(),
            tasks = self.tasks.len(),
            "Scheduler started"
        );
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick_once().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Scheduler stopping");
                        break;
                    }
                }
            }
        }
    }
}
