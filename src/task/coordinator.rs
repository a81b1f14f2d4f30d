use tracing::{debug, info, warn};

use super::event::{Effect, Event, NoticeLevel};
use super::state::{Task, TaskState};
use crate::common::api::models::task::{CaptchaResponse, StatusResponse, TaskStatus};

const MSG_TASK_STARTED: &str = "下载任务已启动...";
const MSG_CAPTCHA_EMPTY: &str = "请输入验证码";
const MSG_CAPTCHA_BUSY: &str = "验证码正在提交，请稍候";
const MSG_CAPTCHA_ACCEPTED: &str = "验证码提交成功，继续下载...";
const MSG_CAPTCHA_REJECTED: &str = "验证码提交失败";
const MSG_CAPTCHA_NETWORK: &str = "提交验证码失败，请检查网络连接";

/// 任务轮询与验证码中转的状态机
///
/// 只负责状态转换，所有副作用以 [`Effect`] 的形式按顺序返回，
/// 由 [`TaskRunner`](super::runner::TaskRunner) 执行。
/// 因此“先停轮询、再弹验证码”的顺序由返回值的顺序保证。
#[derive(Debug, Default)]
pub struct Coordinator {
    state: TaskState,
    task: Option<Task>,
    // 存活计时器的代数，None 表示没有计时器
    polling: Option<u64>,
    next_generation: u64,
    captcha_visible: bool,
    captcha_in_flight: bool,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.task.as_ref().map(|task| task.id.as_str())
    }

    pub fn polling_generation(&self) -> Option<u64> {
        self.polling
    }

    pub fn is_polling(&self) -> bool {
        self.polling.is_some()
    }

    pub fn captcha_visible(&self) -> bool {
        self.captcha_visible
    }

    pub fn captcha_in_flight(&self) -> bool {
        self.captcha_in_flight
    }

    /// 状态转换函数
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        debug!("事件: {:?} (状态: {:?})", event, self.state);
        let mut effects = Vec::new();

        match event {
            Event::Started { task_id } => self.on_started(task_id, &mut effects),
            Event::Tick {
                task_id,
                generation,
            } => self.on_tick(&task_id, generation, &mut effects),
            Event::StatusReceived {
                task_id,
                generation,
                response,
            } => self.on_status(&task_id, generation, response, &mut effects),
            Event::StatusFailed {
                task_id,
                generation,
                error,
            } => {
                if self.is_active(&task_id) && self.polling == Some(generation) {
                    // 下一次计时器触发时自然重试
                    warn!("状态查询失败 {}: {}", task_id, error);
                }
            }
            Event::CaptchaEntered { task_id, code } => {
                self.on_captcha_entered(task_id, code, &mut effects)
            }
            Event::CaptchaAnswered { task_id, response } => {
                self.on_captcha_answered(&task_id, response, &mut effects)
            }
            Event::CaptchaFailed { task_id, error } => {
                if self.is_active(&task_id) && self.state == TaskState::NeedCaptcha {
                    warn!("验证码提交失败 {}: {}", task_id, error);
                    self.captcha_in_flight = false;
                    effects.push(Effect::Notify {
                        level: NoticeLevel::Danger,
                        message: MSG_CAPTCHA_NETWORK.to_string(),
                    });
                }
            }
        }

        effects
    }

    fn is_active(&self, task_id: &str) -> bool {
        self.active_task_id() == Some(task_id)
    }

    fn set_state(&mut self, next: TaskState) {
        if self.state != next {
            info!("任务状态: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn stop_polling(&mut self, effects: &mut Vec<Effect>) {
        if let Some(generation) = self.polling.take() {
            debug!("停止轮询 (代数 {})", generation);
            effects.push(Effect::StopPolling);
        }
    }

    /// 启动新的计时器，旧的一定先停掉
    fn start_polling(&mut self, task_id: &str, effects: &mut Vec<Effect>) {
        self.stop_polling(effects);
        let generation = self.next_generation;
        self.next_generation += 1;
        self.polling = Some(generation);
        effects.push(Effect::StartPolling {
            task_id: task_id.to_string(),
            generation,
        });
    }

    fn hide_captcha(&mut self, effects: &mut Vec<Effect>) {
        if self.captcha_visible {
            self.captcha_visible = false;
            effects.push(Effect::HideCaptcha);
        }
    }

    fn on_started(&mut self, task_id: String, effects: &mut Vec<Effect>) {
        if let Some(previous) = self.active_task_id() {
            info!("新任务 {} 取代任务 {}", task_id, previous);
        }
        self.stop_polling(effects);
        self.hide_captcha(effects);
        self.captcha_in_flight = false;

        self.task = Some(Task::new(task_id.clone()));
        self.set_state(TaskState::Pending);
        effects.push(Effect::ShowStatus {
            status: TaskStatus::Pending,
            message: MSG_TASK_STARTED.to_string(),
            filename: None,
        });
        self.start_polling(&task_id, effects);
    }

    fn on_tick(&mut self, task_id: &str, generation: u64, effects: &mut Vec<Effect>) {
        // 已取消的计时器残留的触发
        if self.polling != Some(generation) {
            debug!("忽略过期的计时器触发 (代数 {})", generation);
            return;
        }
        if !self.is_active(task_id) {
            return;
        }
        effects.push(Effect::FetchStatus {
            task_id: task_id.to_string(),
            generation,
        });
    }

    fn on_status(
        &mut self,
        task_id: &str,
        generation: u64,
        response: StatusResponse,
        effects: &mut Vec<Effect>,
    ) {
        if !self.is_active(task_id) {
            debug!("忽略已被取代的任务 {} 的状态", task_id);
            return;
        }
        // 发起请求的计时器已经不在了，响应对应的是旧的轮询
        if self.polling != Some(generation) {
            debug!("忽略迟到的状态响应 (代数 {})", generation);
            return;
        }
        if !response.success {
            warn!("状态查询被拒绝: {}", response.message());
            return;
        }

        let Some(status) = response.status.clone() else {
            debug!("状态响应缺少 status 字段");
            return;
        };
        let message = response.message().to_string();
        let filename = response.filename().map(str::to_string);

        match status {
            TaskStatus::Pending | TaskStatus::Downloading => {
                if status == TaskStatus::Downloading && self.state == TaskState::Pending {
                    self.set_state(TaskState::Downloading);
                }
                self.record(&status, &message, None);
                effects.push(Effect::ShowStatus {
                    status,
                    message,
                    filename: None,
                });
            }
            TaskStatus::Completed => {
                self.record(&status, &message, filename.clone());
                effects.push(Effect::ShowStatus {
                    status,
                    message,
                    filename,
                });
                self.stop_polling(effects);
                self.set_state(TaskState::Completed);
                effects.push(Effect::RefreshFiles);
                self.hide_captcha(effects);
            }
            TaskStatus::Failed => {
                self.record(&status, &message, None);
                effects.push(Effect::ShowStatus {
                    status,
                    message,
                    filename: None,
                });
                self.stop_polling(effects);
                self.set_state(TaskState::Failed);
                self.hide_captcha(effects);
            }
            TaskStatus::NeedCaptcha => {
                // 必须在展示验证码之前停止轮询
                self.stop_polling(effects);
                self.set_state(TaskState::NeedCaptcha);
                self.record(&status, &message, None);

                let image = response.captcha_image;
                if let Some(task) = self.task.as_mut() {
                    task.captcha_image = image.clone();
                }
                match image {
                    Some(image) if self.captcha_visible => {
                        effects.push(Effect::UpdateCaptcha { image });
                    }
                    image => {
                        self.captcha_visible = true;
                        effects.push(Effect::ShowCaptcha {
                            task_id: task_id.to_string(),
                            image,
                        });
                    }
                }
            }
            TaskStatus::Unknown(raw) => {
                debug!("未知的任务状态: {}", raw);
            }
        }
    }

    fn record(&mut self, status: &TaskStatus, message: &str, filename: Option<String>) {
        if let Some(task) = self.task.as_mut() {
            task.status = status.clone();
            task.message = Some(message.to_string());
            if filename.is_some() {
                task.filename = filename;
            }
        }
    }

    fn on_captcha_entered(&mut self, task_id: String, code: String, effects: &mut Vec<Effect>) {
        if !self.is_active(&task_id) || self.state != TaskState::NeedCaptcha {
            debug!("任务 {} 当前不需要验证码", task_id);
            return;
        }

        let code = code.trim();
        if code.is_empty() {
            effects.push(Effect::Notify {
                level: NoticeLevel::Warning,
                message: MSG_CAPTCHA_EMPTY.to_string(),
            });
            return;
        }
        if self.captcha_in_flight {
            effects.push(Effect::Notify {
                level: NoticeLevel::Warning,
                message: MSG_CAPTCHA_BUSY.to_string(),
            });
            return;
        }

        self.captcha_in_flight = true;
        effects.push(Effect::SubmitCaptcha {
            task_id,
            code: code.to_string(),
        });
    }

    fn on_captcha_answered(
        &mut self,
        task_id: &str,
        response: CaptchaResponse,
        effects: &mut Vec<Effect>,
    ) {
        if !self.is_active(task_id) || self.state != TaskState::NeedCaptcha {
            debug!("忽略过期的验证码响应 {}", task_id);
            return;
        }
        self.captcha_in_flight = false;

        if response.success {
            effects.push(Effect::Notify {
                level: NoticeLevel::Success,
                message: MSG_CAPTCHA_ACCEPTED.to_string(),
            });
            self.hide_captcha(effects);
            self.set_state(TaskState::Downloading);
            if let Some(task) = self.task.as_mut() {
                task.status = TaskStatus::Downloading;
                task.captcha_image = None;
            }
            // 新的计时器，重新计时
            self.start_polling(task_id, effects);
        } else {
            let message = response
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| MSG_CAPTCHA_REJECTED.to_string());
            effects.push(Effect::Notify {
                level: NoticeLevel::Danger,
                message,
            });
            if let Some(image) = response.captcha_image {
                if let Some(task) = self.task.as_mut() {
                    task.captcha_image = Some(image.clone());
                }
                effects.push(Effect::UpdateCaptcha { image });
            }
            effects.push(Effect::ResetCaptchaInput);
        }
    }
}
