#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use patent_dl::common::api::client::PatentApi;
use patent_dl::common::api::error::ApiError;
use patent_dl::common::api::models::files::{FileEntry, ListFilesResponse};
use patent_dl::common::api::models::patent::{
    CheckLocalResponse, PatentSummary, SearchResponse, ValidateResponse,
};
use patent_dl::common::api::models::task::{
    CaptchaImage, CaptchaResponse, StartDownloadResponse, StatusResponse, TaskStatus,
};
use patent_dl::task::{NoticeLevel, Presenter};

pub fn status(raw: &str, message: &str) -> StatusResponse {
    StatusResponse {
        success: true,
        status: Some(TaskStatus::from(raw.to_string())),
        message: Some(message.to_string()),
        filename: Some(String::new()),
        captcha_image: None,
    }
}

pub fn need_captcha(image: &str) -> StatusResponse {
    StatusResponse {
        captcha_image: Some(CaptchaImage::new(image)),
        ..status("need_captcha", "请输入验证码")
    }
}

pub fn completed(filename: &str) -> StatusResponse {
    StatusResponse {
        filename: Some(filename.to_string()),
        ..status("completed", "下载完成")
    }
}

pub fn captcha_accepted() -> CaptchaResponse {
    CaptchaResponse {
        success: true,
        message: Some("验证码已提交，正在处理...".to_string()),
        captcha_image: None,
    }
}

pub fn captcha_rejected(message: &str, image: Option<&str>) -> CaptchaResponse {
    CaptchaResponse {
        success: false,
        message: Some(message.to_string()),
        captcha_image: image.map(CaptchaImage::new),
    }
}

/// 按脚本返回响应的服务端，同时记录每次调用
#[derive(Default)]
pub struct ScriptedApi {
    statuses: Mutex<HashMap<String, VecDeque<Result<StatusResponse, ApiError>>>>,
    captcha_replies: Mutex<VecDeque<Result<CaptchaResponse, ApiError>>>,
    validate: Mutex<Option<Result<ValidateResponse, ApiError>>>,
    check_local: Mutex<Option<CheckLocalResponse>>,
    start: Mutex<Option<StartDownloadResponse>>,
    search: Mutex<Option<SearchResponse>>,
    files: Mutex<Vec<FileEntry>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, task_id: &str, response: StatusResponse) {
        self.push_status_result(task_id, Ok(response));
    }

    pub fn push_status_result(&self, task_id: &str, response: Result<StatusResponse, ApiError>) {
        self.statuses
            .lock()
            .unwrap()
            .entry(task_id.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn push_captcha(&self, response: Result<CaptchaResponse, ApiError>) {
        self.captcha_replies.lock().unwrap().push_back(response);
    }

    pub fn set_validate(&self, response: Result<ValidateResponse, ApiError>) {
        *self.validate.lock().unwrap() = Some(response);
    }

    pub fn set_check_local(&self, response: CheckLocalResponse) {
        *self.check_local.lock().unwrap() = Some(response);
    }

    pub fn set_start(&self, response: StartDownloadResponse) {
        *self.start.lock().unwrap() = Some(response);
    }

    pub fn set_search(&self, response: SearchResponse) {
        *self.search.lock().unwrap() = Some(response);
    }

    pub fn set_files(&self, files: Vec<FileEntry>) {
        *self.files.lock().unwrap() = files;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// 以 prefix 开头的调用次数
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PatentApi for ScriptedApi {
    async fn validate_patent(&self, patent_no: &str) -> Result<ValidateResponse, ApiError> {
        self.record(format!("validate:{}", patent_no));
        self.validate.lock().unwrap().take().unwrap_or_else(|| {
            Ok(ValidateResponse {
                valid: true,
                message: "专利号格式正确".to_string(),
            })
        })
    }

    async fn check_local(&self, patent_no: &str) -> Result<CheckLocalResponse, ApiError> {
        self.record(format!("check_local:{}", patent_no));
        Ok(self.check_local.lock().unwrap().take().unwrap_or_default())
    }

    async fn start_download(&self, patent_no: &str) -> Result<StartDownloadResponse, ApiError> {
        self.record(format!("start:{}", patent_no));
        Ok(self.start.lock().unwrap().take().unwrap_or_else(|| StartDownloadResponse {
            success: true,
            task_id: Some(format!("download_{}", patent_no)),
            message: Some("下载任务已启动".to_string()),
            ..Default::default()
        }))
    }

    async fn download_status(&self, task_id: &str) -> Result<StatusResponse, ApiError> {
        self.record(format!("status:{}", task_id));
        self.statuses
            .lock()
            .unwrap()
            .get_mut(task_id)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Ok(status("downloading", "正在下载...")))
    }

    async fn submit_captcha(
        &self,
        task_id: &str,
        captcha_code: &str,
    ) -> Result<CaptchaResponse, ApiError> {
        self.record(format!("captcha:{}:{}", task_id, captcha_code));
        self.captcha_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(captcha_accepted()))
    }

    async fn search_patents(&self, keywords: &str, page: u32) -> Result<SearchResponse, ApiError> {
        self.record(format!("search:{}:{}", keywords, page));
        Ok(self.search.lock().unwrap().take().unwrap_or_default())
    }

    async fn list_files(&self) -> Result<ListFilesResponse, ApiError> {
        self.record("list_files".to_string());
        Ok(ListFilesResponse {
            success: true,
            message: None,
            files: self.files.lock().unwrap().clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Status(String, String, Option<String>),
    Notice(NoticeLevel, String),
    Captcha(String, Option<String>),
    CaptchaUpdated(String),
    InputReset,
    CaptchaHidden,
    Files(Vec<String>),
    Search(String, u32, Vec<String>),
}

/// 记录所有展示调用的 Presenter
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub shown: Vec<Shown>,
}

impl RecordingPresenter {
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.shown
            .iter()
            .filter_map(|shown| match shown {
                Shown::Notice(level, message) => Some((*level, message.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Shown) -> bool) -> usize {
        self.shown.iter().filter(|shown| pred(shown)).count()
    }
}

impl Presenter for RecordingPresenter {
    fn show_status(&mut self, status: &TaskStatus, message: &str, filename: Option<&str>) {
        self.shown.push(Shown::Status(
            status.to_string(),
            message.to_string(),
            filename.map(str::to_string),
        ));
    }

    fn notify(&mut self, level: NoticeLevel, message: &str) {
        self.shown.push(Shown::Notice(level, message.to_string()));
    }

    fn show_captcha(&mut self, task_id: &str, image: Option<&CaptchaImage>) {
        self.shown.push(Shown::Captcha(
            task_id.to_string(),
            image.map(|image| image.as_base64().to_string()),
        ));
    }

    fn update_captcha(&mut self, image: &CaptchaImage) {
        self.shown
            .push(Shown::CaptchaUpdated(image.as_base64().to_string()));
    }

    fn reset_captcha_input(&mut self) {
        self.shown.push(Shown::InputReset);
    }

    fn hide_captcha(&mut self) {
        self.shown.push(Shown::CaptchaHidden);
    }

    fn show_files(&mut self, files: &[FileEntry]) {
        self.shown.push(Shown::Files(
            files.iter().map(|file| file.filename.clone()).collect(),
        ));
    }

    fn show_search_results(&mut self, keywords: &str, page: u32, patents: &[PatentSummary]) {
        self.shown.push(Shown::Search(
            keywords.to_string(),
            page,
            patents
                .iter()
                .filter_map(|patent| patent.patent_no.clone())
                .collect(),
        ));
    }
}
