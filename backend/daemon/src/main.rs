mod config;
mod dispatch;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use paceline_core::{Clock, SystemClock};
use paceline_dedup::{DeadlineSlots, DedupLedger, MemoryKv};
use paceline_notify::{NotificationRetrier, RetryPolicy, TelegramClient};
use paceline_scheduler::{DelayQueue, ScheduleConfig, Scheduler, TickContext};
use paceline_store::{CourseStore, IntakeLogStore, SqliteCourseStore};
use paceline_workflow::{ActivationFlow, AppealWorkflow, SupervisorActions};

use config::PacelineConfig;
use dispatch::Dispatcher;

#[tokio::main]
async fn main() -> Result<()> {
    let dir = config::config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    let cfg = PacelineConfig::load(&config::config_file_path(&dir))
        .context("Failed to load configuration")?;
    let _log_guard = logging::init(dir.join(&cfg.log_dir), &cfg.log_level);
    cfg.validate()?;
    info!(group_chat_id = cfg.group_chat_id, "Paceline starting");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::at_utc_offset_hours(cfg.utc_offset_hours));
    let db_path = dir.join(&cfg.db_path);
    let store = Arc::new(
        SqliteCourseStore::open(
            db_path.to_str().context("Config directory path is not UTF-8")?,
            clock.clone(),
        )
        .context("Failed to open course store")?,
    );
    let course_store: Arc<dyn CourseStore> = store.clone();
    let log_store: Arc<dyn IntakeLogStore> = store;

    let kv = Arc::new(MemoryKv::new(clock.clone()));
    let ledger = DedupLedger::new(kv.clone(), clock.clone());
    let slots = DeadlineSlots::new(kv);

    let client = Arc::new(TelegramClient::new(&cfg.bot_token));
    let notifier = Arc::new(NotificationRetrier::new(client.clone(), RetryPolicy::default()));

    let schedule = ScheduleConfig {
        tick_interval: Duration::from_secs(cfg.tick_interval_secs),
        max_strikes: cfg.max_strikes,
        max_appeals: cfg.max_appeals,
        group_chat_id: cfg.group_chat_id,
        broadcast_chat_id: cfg.broadcast_chat_id,
        reminder_ttl: Duration::from_secs(cfg.reminder_ttl_minutes * 60),
        cleanup_after_hours: cfg.cleanup_after_hours,
    };
    let ctx = Arc::new(TickContext {
        store: course_store.clone(),
        logs: log_store.clone(),
        ledger,
        slots: slots.clone(),
        notifier: notifier.clone(),
        clock: clock.clone(),
        cfg: schedule,
    });
    let delay = Arc::new(DelayQueue::new());
    let scheduler = Scheduler::with_standard_tasks(ctx, delay.clone());

    let activation = ActivationFlow::new(
        course_store.clone(),
        notifier.clone(),
        clock.clone(),
        cfg.group_chat_id,
    );
    let appeals = AppealWorkflow::new(
        course_store.clone(),
        slots,
        notifier.clone(),
        clock.clone(),
        cfg.group_chat_id,
        cfg.max_appeals,
    );
    let supervisor = SupervisorActions::new(
        course_store,
        log_store,
        notifier,
        clock.clone(),
        cfg.group_chat_id,
    );
    let dispatcher =
        Dispatcher::new(client, activation, appeals, supervisor, clock, cfg.group_chat_id);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = {
        let rx = shutdown_rx.clone();
        tokio::spawn(async move { scheduler.run(rx).await })
    };
    let dispatcher_task = tokio::spawn(async move { dispatcher.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");
    shutdown_tx.send(true).ok();
    scheduler_task.await.ok();
    dispatcher_task.await.ok();
    // Pending reminder deletions are timers hours out; drop them.
    delay.abandon_all().await;
    info!("Paceline stopped");
    Ok(())
}
