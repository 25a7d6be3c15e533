// src/web/types.rs
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};

use crate::assistant::AssistantReply;
use crate::jobs::repository::{Application, ApplicationStatus};
use crate::jobs::{Job, JobPage};
use crate::query::ExtractedQuery;

pub type ApiError = Custom<Json<StandardErrorResponse>>;
pub type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_format: Option<DisplayFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_actions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Data,
    Action,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DisplayFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<DisplaySection>>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DisplaySection {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<String>>,
}

// Request types with conversation_id support
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardRequest<T> {
    #[serde(flatten)]
    pub data: T,
    pub conversation_id: Option<String>,
}

pub trait WithConversationId {
    fn conversation_id(&self) -> Option<String>;
}

impl<T> WithConversationId for StandardRequest<T> {
    fn conversation_id(&self) -> Option<String> {
        self.conversation_id.clone()
    }
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ChatRequest {
    pub message: String,
    pub labourer_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ApplyRequest {
    pub labourer_id: i64,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ApplicationStatusRequest {
    pub status: ApplicationStatus,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct InterpretData {
    pub text: String,
    pub query: ExtractedQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_filter: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobListData {
    pub jobs: Vec<Job>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<ExtractedQuery>,
}

impl JobListData {
    pub fn from_page(page: JobPage, query: Option<ExtractedQuery>) -> Self {
        let pages = page.pages();
        Self {
            jobs: page.jobs,
            total: page.total,
            page: page.page,
            limit: page.limit,
            pages,
            query,
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RecommendationData<T> {
    pub recommendations: Vec<T>,
    pub total: usize,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ApplicationListData {
    pub applications: Vec<Application>,
    pub total: usize,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthData {
    pub status: String,
    pub database: String,
    pub version: String,
}

pub type ChatData = AssistantReply;

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            display_format: None,
            conversation_id,
        }
    }

    pub fn with_display_format(mut self, display_format: DisplayFormat) -> Self {
        self.display_format = Some(display_format);
        self
    }
}

impl<T> ActionResponse<T> {
    pub fn success(
        message: String,
        action: String,
        data: T,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            data,
            next_actions: None,
            conversation_id,
        }
    }

    pub fn with_next_actions(mut self, next_actions: Vec<String>) -> Self {
        self.next_actions = Some(next_actions);
        self
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            conversation_id,
        }
    }

    pub fn with_status(self, status: Status) -> ApiError {
        Custom(status, Json(self))
    }
}
