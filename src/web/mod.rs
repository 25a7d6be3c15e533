// src/web/mod.rs
pub mod handlers;
pub mod types;

pub use types::*;

use crate::assistant::JobAssistant;
use crate::config::AppConfig;
use crate::database::{self, DatabaseConfig};
use crate::jobs::{JobFilter, NewJob};
use crate::labourers::NewLabourer;
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{
    catchers, delete, get, options, patch, post, put, routes, Build, Request, Response, Rocket,
    State,
};
use tracing::{error, info};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

#[post("/assistant/chat", data = "<request>")]
pub async fn chat(
    request: Json<StandardRequest<ChatRequest>>,
    assistant: &State<JobAssistant>,
) -> ApiResult<DataResponse<ChatData>> {
    handlers::chat_handler(request, assistant).await
}

#[get("/assistant/interpret?<text>")]
pub async fn interpret(
    text: String,
    assistant: &State<JobAssistant>,
) -> ApiResult<DataResponse<InterpretData>> {
    handlers::interpret_handler(text, assistant).await
}

#[get("/jobs?<skill>&<location>&<page>&<limit>")]
pub async fn list_jobs(
    skill: Option<String>,
    location: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<JobListData>> {
    let filter = JobFilter::new(skill, location, page, limit);
    handlers::list_jobs_handler(filter, db_config).await
}

#[get("/jobs/search?<q>&<page>&<limit>")]
pub async fn search_jobs(
    q: String,
    page: Option<u32>,
    limit: Option<u32>,
    assistant: &State<JobAssistant>,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<JobListData>> {
    handlers::search_jobs_handler(q, page, limit, assistant, db_config).await
}

#[get("/jobs/insights")]
pub async fn insights(
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<crate::jobs::MarketInsights>> {
    handlers::insights_handler(db_config).await
}

#[get("/jobs/<id>")]
pub async fn get_job(
    id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<crate::jobs::Job>> {
    handlers::get_job_handler(id, db_config).await
}

#[post("/jobs", data = "<request>")]
pub async fn create_job(
    request: Json<StandardRequest<NewJob>>,
    db_config: &State<DatabaseConfig>,
) -> Result<Custom<Json<ActionResponse<crate::jobs::Job>>>, ApiError> {
    handlers::create_job_handler(request, db_config).await
}

#[put("/jobs/<id>", data = "<request>")]
pub async fn update_job(
    id: i64,
    request: Json<StandardRequest<NewJob>>,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<ActionResponse<crate::jobs::Job>> {
    handlers::update_job_handler(id, request, db_config).await
}

#[delete("/jobs/<id>")]
pub async fn delete_job(
    id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<ActionResponse<crate::jobs::Job>> {
    handlers::delete_job_handler(id, db_config).await
}

#[get("/jobs/<id>/applications")]
pub async fn job_applications(
    id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<ApplicationListData>> {
    handlers::job_applications_handler(id, db_config).await
}

#[post("/jobs/<id>/apply", data = "<request>")]
pub async fn apply(
    id: i64,
    request: Json<StandardRequest<ApplyRequest>>,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<ActionResponse<crate::jobs::repository::Application>> {
    handlers::apply_handler(id, request, db_config).await
}

#[post("/labourers", data = "<request>")]
pub async fn create_labourer(
    request: Json<StandardRequest<NewLabourer>>,
    db_config: &State<DatabaseConfig>,
) -> Result<Custom<Json<ActionResponse<crate::labourers::Labourer>>>, ApiError> {
    handlers::create_labourer_handler(request, db_config).await
}

#[get("/labourers/<id>")]
pub async fn get_labourer(
    id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<crate::labourers::Labourer>> {
    handlers::get_labourer_handler(id, db_config).await
}

#[get("/labourers/<id>/applications")]
pub async fn labourer_applications(
    id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<ApplicationListData>> {
    handlers::labourer_applications_handler(id, db_config).await
}

#[patch("/applications/<id>", data = "<request>")]
pub async fn update_application_status(
    id: i64,
    request: Json<StandardRequest<ApplicationStatusRequest>>,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<ActionResponse<crate::jobs::repository::Application>> {
    handlers::update_application_status_handler(id, request, db_config).await
}

#[get("/recommendations/jobs/<labourer_id>")]
pub async fn recommend_jobs(
    labourer_id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<RecommendationData<crate::recommend::ScoredJob>>> {
    handlers::job_recommendations_handler(labourer_id, db_config).await
}

#[get("/recommendations/labourers/<job_id>")]
pub async fn recommend_labourers(
    job_id: i64,
    db_config: &State<DatabaseConfig>,
) -> ApiResult<DataResponse<RecommendationData<crate::recommend::ScoredLabourer>>> {
    handlers::labourer_recommendations_handler(job_id, db_config).await
}

#[get("/health")]
pub async fn health(db_config: &State<DatabaseConfig>) -> Json<DataResponse<HealthData>> {
    handlers::health_handler(db_config).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(404)]
pub fn not_found(request: &Request) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("No endpoint at {}", request.uri().path()),
        "NOT_FOUND".to_string(),
        vec!["Check the endpoint path and method".to_string()],
        None,
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body could not be parsed".to_string(),
        "VALIDATION_ERROR".to_string(),
        vec![
            "Verify all required fields are present".to_string(),
            "Check field types, e.g. wage must be a number".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
        None,
    ))
}

/// Mount the API, catchers and shared state on a Rocket instance.
pub fn mount_api(
    rocket: Rocket<Build>,
    db_config: DatabaseConfig,
    assistant: JobAssistant,
) -> Rocket<Build> {
    rocket
        .attach(Cors)
        .manage(db_config)
        .manage(assistant)
        .register(
            "/api",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                chat,
                interpret,
                list_jobs,
                search_jobs,
                insights,
                get_job,
                create_job,
                update_job,
                delete_job,
                job_applications,
                apply,
                create_labourer,
                get_labourer,
                labourer_applications,
                update_application_status,
                recommend_jobs,
                recommend_labourers,
                health,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: &AppConfig) -> Result<()> {
    let db_config = match database::connect(config.database_path.clone()).await {
        Ok(db_config) => db_config,
        Err(e) => {
            error!("Failed to initialize database: {:#}", e);
            return Err(e);
        }
    };

    let vocabulary = config.load_vocabulary()?;
    let assistant = crate::build_assistant(&db_config, vocabulary)?;

    info!("Starting labour-assist API server ({})", config.environment);
    info!("Database: {}", db_config.database_path.display());
    info!("Listening on {}:{}", config.address, config.port);

    let figment = rocket::Config::figment()
        .merge(("address", config.address.clone()))
        .merge(("port", config.port));

    let _rocket = mount_api(rocket::custom(figment), db_config, assistant)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket server failed: {}", e))?;

    Ok(())
}
