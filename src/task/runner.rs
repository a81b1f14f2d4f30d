use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use super::coordinator::Coordinator;
use super::event::{Effect, Event, NoticeLevel};
use super::poller::PollHandle;
use super::presenter::Presenter;
use super::state::TaskState;
use crate::common::api::client::PatentApi;
use crate::common::api::error::ApiError;
use crate::common::api::models::files::ListFilesResponse;
use crate::common::api::models::task::TaskStatus;

const MSG_PATENT_EMPTY: &str = "请输入专利号";
const MSG_KEYWORDS_EMPTY: &str = "请输入搜索关键词";
const MSG_DOWNLOAD_NETWORK: &str = "下载请求失败，请检查网络连接";
const MSG_SEARCH_NETWORK: &str = "搜索请求失败，请检查网络连接";
const MSG_FILES_FAILED: &str = "加载文件列表失败";
const MSG_START_FAILED: &str = "下载任务启动失败";

/// 事件队列里的消息，计时器和网络回调都汇入这里
#[derive(Debug)]
pub enum Inbound {
    Machine(Event),
    FilesListed(Result<ListFilesResponse, ApiError>),
}

impl From<Event> for Inbound {
    fn from(event: Event) -> Self {
        Inbound::Machine(event)
    }
}

/// 驱动 [`Coordinator`]：执行它产出的副作用，并把回调结果送回状态机
///
/// 所有事件经由同一个队列逐个处理，网络请求在后台任务中完成。
pub struct TaskRunner<A: PatentApi, P: Presenter> {
    api: Arc<A>,
    presenter: P,
    coordinator: Coordinator,
    poller: Option<PollHandle>,
    poll_interval: Duration,
    events_tx: UnboundedSender<Inbound>,
    events_rx: UnboundedReceiver<Inbound>,
    pending_refreshes: usize,
    timers_started: usize,
}

impl<A: PatentApi, P: Presenter> TaskRunner<A, P> {
    pub fn new(api: Arc<A>, presenter: P, poll_interval: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            presenter,
            coordinator: Coordinator::new(),
            poller: None,
            poll_interval,
            events_tx,
            events_rx,
            pending_refreshes: 0,
            timers_started: 0,
        }
    }

    pub fn state(&self) -> TaskState {
        self.coordinator.state()
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.coordinator.active_task_id()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// 当前存活计时器绑定的任务
    pub fn polling_task(&self) -> Option<&str> {
        self.poller
            .as_ref()
            .filter(|handle| handle.is_active())
            .map(|handle| handle.task_id())
    }

    /// 自创建以来启动过的计时器数量
    pub fn timers_started(&self) -> usize {
        self.timers_started
    }

    /// 校验专利号、检查本地文件、再向服务端发起下载
    ///
    /// 创建了任务时返回任务 ID，其余情况都通过 [`Presenter`] 提示用户。
    pub async fn start_download(&mut self, patent_no: &str) -> Option<String> {
        let patent_no = patent_no.trim();
        if patent_no.is_empty() {
            self.presenter.notify(NoticeLevel::Warning, MSG_PATENT_EMPTY);
            return None;
        }

        match self.request_download(patent_no).await {
            Ok(task_id) => task_id,
            Err(e) => {
                error!("下载请求失败: {}", e);
                self.presenter
                    .notify(NoticeLevel::Danger, MSG_DOWNLOAD_NETWORK);
                None
            }
        }
    }

    async fn request_download(&mut self, patent_no: &str) -> Result<Option<String>, ApiError> {
        let validation = self.api.validate_patent(patent_no).await?;
        if !validation.valid {
            self.presenter
                .notify(NoticeLevel::Danger, &validation.message);
            return Ok(None);
        }

        let local = self.api.check_local(patent_no).await?;
        if local.exists {
            let filename = local.filename.unwrap_or_default();
            self.presenter
                .notify(NoticeLevel::Info, &format!("文件已存在: {}", filename));
            return Ok(None);
        }

        let resp = self.api.start_download(patent_no).await?;
        if !resp.success {
            let message = resp.message.unwrap_or_else(|| MSG_START_FAILED.to_string());
            self.presenter.notify(NoticeLevel::Danger, &message);
            return Ok(None);
        }

        match (resp.task_id, resp.status) {
            (Some(task_id), _) => {
                info!("下载任务已创建: {}", task_id);
                self.start_task(&task_id);
                Ok(Some(task_id))
            }
            (None, Some(TaskStatus::Completed)) => {
                // 服务端已有该文件，没有创建任务
                let message = match resp.filename {
                    Some(filename) => format!("文件已存在: {}", filename),
                    None => resp.message.unwrap_or_default(),
                };
                self.presenter.notify(NoticeLevel::Info, &message);
                Ok(None)
            }
            (None, status) => {
                warn!("启动响应缺少任务 ID (状态: {:?})", status);
                let message = resp.message.unwrap_or_else(|| MSG_START_FAILED.to_string());
                self.presenter.notify(NoticeLevel::Danger, &message);
                Ok(None)
            }
        }
    }

    /// 以服务端返回的任务 ID 开始轮询，取代之前的任务
    pub fn start_task(&mut self, task_id: &str) {
        self.dispatch(Event::Started {
            task_id: task_id.to_string(),
        });
    }

    pub fn submit_captcha(&mut self, task_id: &str, code: &str) {
        self.dispatch(Event::CaptchaEntered {
            task_id: task_id.to_string(),
            code: code.to_string(),
        });
    }

    /// 把事件交给状态机并按顺序执行产出的副作用
    pub fn dispatch(&mut self, event: Event) {
        let effects = self.coordinator.handle(event);
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        debug!("执行: {:?}", effect);
        match effect {
            Effect::StopPolling => {
                if let Some(handle) = self.poller.take() {
                    handle.cancel();
                }
            }
            Effect::StartPolling {
                task_id,
                generation,
            } => {
                if let Some(old) = self.poller.take() {
                    old.cancel();
                }
                self.poller = Some(PollHandle::spawn(
                    task_id,
                    generation,
                    self.poll_interval,
                    self.events_tx.clone(),
                ));
                self.timers_started += 1;
            }
            Effect::FetchStatus {
                task_id,
                generation,
            } => {
                let api = Arc::clone(&self.api);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = api.download_status(&task_id).await;
                    let event = match result {
                        Ok(response) => Event::StatusReceived {
                            task_id,
                            generation,
                            response,
                        },
                        Err(e) => {
                            if !e.is_transport() {
                                error!("状态响应异常: {}", e);
                            }
                            Event::StatusFailed {
                                task_id,
                                generation,
                                error: e.to_string(),
                            }
                        }
                    };
                    let _ = tx.send(event.into());
                });
            }
            Effect::SubmitCaptcha { task_id, code } => {
                let api = Arc::clone(&self.api);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = api.submit_captcha(&task_id, &code).await;
                    let event = match result {
                        Ok(response) => Event::CaptchaAnswered { task_id, response },
                        Err(e) => Event::CaptchaFailed {
                            task_id,
                            error: e.to_string(),
                        },
                    };
                    let _ = tx.send(event.into());
                });
            }
            Effect::ShowStatus {
                status,
                message,
                filename,
            } => self
                .presenter
                .show_status(&status, &message, filename.as_deref()),
            Effect::ShowCaptcha { task_id, image } => {
                self.presenter.show_captcha(&task_id, image.as_ref())
            }
            Effect::UpdateCaptcha { image } => self.presenter.update_captcha(&image),
            Effect::ResetCaptchaInput => self.presenter.reset_captcha_input(),
            Effect::HideCaptcha => self.presenter.hide_captcha(),
            Effect::Notify { level, message } => self.presenter.notify(level, &message),
            Effect::RefreshFiles => {
                self.pending_refreshes += 1;
                let api = Arc::clone(&self.api);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = api.list_files().await;
                    let _ = tx.send(Inbound::FilesListed(result));
                });
            }
        }
    }

    fn receive(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Machine(event) => self.dispatch(event),
            Inbound::FilesListed(result) => {
                self.pending_refreshes = self.pending_refreshes.saturating_sub(1);
                self.render_files(result);
            }
        }
    }

    /// 处理队列中的下一条消息
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(inbound) => {
                self.receive(inbound);
                true
            }
            None => false,
        }
    }

    /// 持续处理事件，直到任务结束或需要用户输入验证码
    pub async fn run_until_blocked(&mut self) -> TaskState {
        while self.is_busy() {
            if !self.step().await {
                break;
            }
        }
        self.state()
    }

    fn is_busy(&self) -> bool {
        self.coordinator.is_polling()
            || self.coordinator.captcha_in_flight()
            || self.pending_refreshes > 0
    }

    pub async fn refresh_files(&mut self) {
        let result = self.api.list_files().await;
        self.render_files(result);
    }

    fn render_files(&mut self, result: Result<ListFilesResponse, ApiError>) {
        match result {
            Ok(resp) if resp.success => self.presenter.show_files(&resp.files),
            Ok(resp) => {
                let message = resp.message.unwrap_or_else(|| MSG_FILES_FAILED.to_string());
                self.presenter.notify(NoticeLevel::Danger, &message);
            }
            Err(e) => {
                error!("加载文件列表错误: {}", e);
                self.presenter.notify(NoticeLevel::Danger, MSG_FILES_FAILED);
            }
        }
    }

    pub async fn search(&mut self, keywords: &str, page: u32) {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            self.presenter.notify(NoticeLevel::Warning, MSG_KEYWORDS_EMPTY);
            return;
        }
        let page = page.max(1);

        match self.api.search_patents(keywords, page).await {
            Ok(resp) if resp.success => {
                let shown_keywords = resp.keywords.as_deref().unwrap_or(keywords);
                let shown_page = resp.page.unwrap_or(page);
                self.presenter
                    .show_search_results(shown_keywords, shown_page, &resp.patents);
            }
            Ok(resp) => {
                let message = resp.message.unwrap_or_else(|| "搜索失败".to_string());
                self.presenter.notify(NoticeLevel::Danger, &message);
            }
            Err(e) => {
                error!("搜索错误: {}", e);
                self.presenter.notify(NoticeLevel::Danger, MSG_SEARCH_NETWORK);
            }
        }
    }
}
