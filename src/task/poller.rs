use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::event::Event;

/// 绑定到某个任务的可取消重复计时器
///
/// 第一次触发发生在一个完整周期之后。句柄被丢弃时计时器随之取消。
#[derive(Debug)]
pub struct PollHandle {
    task_id: String,
    generation: u64,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl PollHandle {
    pub fn spawn<T>(
        task_id: impl Into<String>,
        generation: u64,
        period: Duration,
        events: UnboundedSender<T>,
    ) -> Self
    where
        T: From<Event> + Send + 'static,
    {
        let task_id = task_id.into();
        let token = CancellationToken::new();

        let child = token.clone();
        let tick_task = task_id.clone();
        let join = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        let tick = Event::Tick {
                            task_id: tick_task.clone(),
                            generation,
                        };
                        if events.send(T::from(tick)).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("轮询计时器退出: {} (代数 {})", tick_task, generation);
        });

        Self {
            task_id,
            generation,
            token,
            join,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.token.cancel();
        self.join.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.join.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
