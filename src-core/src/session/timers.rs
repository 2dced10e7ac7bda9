use log::warn;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Background timers owned by one session controller
#[derive(Debug, Default)]
pub(crate) struct Timers {
    pub polling: Option<JoinHandle<()>>,
    pub countdown: Option<JoinHandle<()>>,
}

impl Timers {
    pub fn is_live(handle: &Option<JoinHandle<()>>) -> bool {
        handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel(handle: &mut Option<JoinHandle<()>>) -> bool {
        match handle.take() {
            Some(h) => {
                h.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        Self::cancel(&mut self.polling);
        Self::cancel(&mut self.countdown);
    }
}

/// Run `on_tick` every `period` while `owner` is alive.
///
/// The timer only holds a weak reference, so dropping the owner ends it on
/// the next firing. With `immediate` the first call happens right away,
/// otherwise after one period. Returns `None` outside a tokio runtime.
pub(crate) fn spawn_every<T, F, Fut>(
    owner: &Arc<T>,
    period: Duration,
    immediate: bool,
    on_tick: F,
) -> Option<JoinHandle<()>>
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!("No tokio runtime; timer not started");
            return None;
        }
    };

    let weak: Weak<T> = Arc::downgrade(owner);
    let period = period.max(Duration::from_millis(1));

    Some(runtime.spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if !immediate {
            // the first tick of a tokio interval completes at once
            ticker.tick().await;
        }
        loop {
            ticker.tick().await;
            let Some(owner) = weak.upgrade() else {
                break;
            };
            on_tick(owner).await;
        }
    }))
}
