//! Real-time driver for hosts without a game loop.
//!
//! Game loops should call [`Engine::advance`] once per frame instead. This
//! driver does the same on a tokio interval, holding the engine lock only
//! for the duration of each `advance`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

use crate::config::DriverConfig;
use crate::engine::Engine;

/// Advance `engine` in real time every `resolution` until `shutdown`
/// resolves.
pub async fn drive<F>(engine: Arc<Mutex<Engine>>, resolution: Duration, shutdown: F)
where
    F: Future<Output = ()>,
{
    let resolution = resolution.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(resolution);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    tokio::pin!(shutdown);

    info!(?resolution, "dialog driver started");
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            now = ticker.tick() => {
                let elapsed = now.saturating_duration_since(last);
                last = now;
                engine.lock().advance(elapsed);
            }
        }
    }
    info!("dialog driver stopped");
}

/// [`drive`] at the resolution from `config`.
pub async fn drive_with_config<F>(engine: Arc<Mutex<Engine>>, config: &DriverConfig, shutdown: F)
where
    F: Future<Output = ()>,
{
    drive(engine, Duration::from_millis(config.resolution_ms), shutdown).await;
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;
    use crate::config::{EngineConfig, NpcConfig};
    use crate::rng::StdRandom;
    use crate::speaker::Transcript;

    fn shared_bard(log: &Transcript, config: EngineConfig) -> Arc<Mutex<Engine>> {
        let mut engine = Engine::with_random(config, StdRandom::seeded(5));
        engine
            .create(
                "bard",
                log.clone(),
                NpcConfig::default().with_tolerance_ms(1500).with_banter(100, 1000),
                "banter=true|La la la.|<<<greeting=true|Well met!|<<<",
            )
            .expect("valid");
        Arc::new(Mutex::new(engine))
    }

    #[tokio::test(start_paused = true)]
    async fn banter_follows_wall_clock() {
        let log = Transcript::new();
        let engine = shared_bard(&log, EngineConfig::default());
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(drive(engine.clone(), Duration::from_millis(50), async move {
            let _ = rx.await;
        }));

        tokio::time::sleep(Duration::from_millis(3010)).await;
        tx.send(()).expect("driver alive");
        task.await.expect("driver finished");

        assert_eq!(log.texts(), ["La la la.", "La la la.", "La la la."]);
        assert_eq!(engine.lock().now(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_expires_in_real_time() {
        let log = Transcript::new();
        let engine_config = EngineConfig::from_toml("[driver]\nresolution_ms = 100\n").expect("valid toml");
        let engine = shared_bard(&log, engine_config);
        let config = engine.lock().driver_config().clone();
        assert_eq!(config.resolution_ms, 100);
        let (tx, rx) = oneshot::channel::<()>();
        let driver_engine = engine.clone();
        let task = tokio::spawn(async move {
            drive_with_config(driver_engine, &config, async move {
                let _ = rx.await;
            })
            .await;
        });

        tokio::time::sleep(Duration::from_millis(510)).await;
        engine.lock().ask("bard", "greeting=true").expect("valid query");
        assert!(engine.lock().is_cooling_down("bard"));

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert!(!engine.lock().is_cooling_down("bard"));

        tx.send(()).expect("driver alive");
        task.await.expect("driver finished");
        assert_eq!(log.texts(), ["Well met!"]);
    }
}
