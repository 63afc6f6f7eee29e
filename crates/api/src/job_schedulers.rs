use crate::dispatch::DispatchEngine;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::info;

/// Time until the next multiple of `interval` since the epoch, so that
/// ticks land on round wall clock times
pub fn get_start_delay(now_millis: i64, interval: Duration) -> Duration {
    let interval_millis = interval.as_millis() as i64;
    let millis_into_interval = now_millis.rem_euclid(interval_millis);
    Duration::from_millis((interval_millis - millis_into_interval) as u64)
}

/// Runs a dispatch tick every tick interval until `true` is sent on
/// `shutdown`. A running tick is always allowed to finish.
pub fn start_send_reminders_job(
    engine: Arc<DispatchEngine>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    actix_web::rt::spawn(async move {
        let ctx = engine.context();
        let tick_interval = ctx.config.cadence.tick_interval();
        let start = Instant::now() + get_start_delay(ctx.sys.get_timestamp_millis(), tick_interval);

        let mut ticks = interval_at(start, tick_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "Send reminders job scheduled every {:?} with a tolerance of {} minutes",
            tick_interval,
            ctx.config.cadence.tolerance().num_minutes()
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!("Stopping the send reminders job");
                    break;
                }
                _ = ticks.tick() => {
                    // Failures are logged and counted by the engine
                    let _ = engine.run_tick(ctx.sys.now()).await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pill_reminder_domain::NotificationCadence;
    use pill_reminder_infra::ReminderContext;

    #[test]
    fn start_delay_works() {
        let minute = Duration::from_secs(60);
        assert_eq!(get_start_delay(50 * 1000, minute), Duration::from_secs(10));
        assert_eq!(get_start_delay(59 * 1000, minute), Duration::from_secs(1));
        assert_eq!(get_start_delay(60 * 1000, minute), Duration::from_secs(60));
        assert_eq!(get_start_delay(61 * 1000 + 500, minute), Duration::from_millis(58_500));
        assert_eq!(
            get_start_delay(15 * 1000, Duration::from_secs(10)),
            Duration::from_secs(5)
        );
    }

    #[actix_web::test]
    async fn it_ticks_until_shut_down() {
        let mut ctx = ReminderContext::create_inmemory();
        ctx.config.cadence = NotificationCadence::new(1, 1).unwrap();
        let engine = Arc::new(DispatchEngine::new(ctx));

        let (shutdown, receiver) = watch::channel(false);
        let job = start_send_reminders_job(engine.clone(), receiver);

        actix_web::rt::time::sleep(Duration::from_millis(2500)).await;
        shutdown.send(true).unwrap();
        job.await.unwrap();

        let ticks = engine.context().stats.snapshot().ticks;
        assert!(ticks >= 1);

        actix_web::rt::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(engine.context().stats.snapshot().ticks, ticks);
    }
}
