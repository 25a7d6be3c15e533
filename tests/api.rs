use labour_assist::{build_assistant, database, mount_api, Vocabulary};
use rocket::http::{ContentType, Method, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

async fn client() -> (TempDir, Client) {
    let dir = TempDir::new().unwrap();
    let db = database::connect(dir.path().join("api.db")).await.unwrap();
    let assistant = build_assistant(&db, Vocabulary::builtin().unwrap()).unwrap();
    let client = Client::tracked(mount_api(rocket::build(), db, assistant))
        .await
        .unwrap();
    (dir, client)
}

async fn post(client: &Client, uri: &str, body: Value) -> (Status, Value) {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    let status = response.status();
    (status, response.into_json::<Value>().await.unwrap())
}

async fn get(client: &Client, uri: &str) -> (Status, Value) {
    let response = client.get(uri).dispatch().await;
    let status = response.status();
    (status, response.into_json::<Value>().await.unwrap())
}

fn job(title: &str, skill: &str, wage: f64, location: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{} needed urgently", title),
        "skill": skill,
        "category": "GENERAL",
        "wage": wage,
        "location": location,
        "duration": "2 weeks",
        "contractor_name": "Rao Infra"
    })
}

#[rocket::async_test]
async fn health_reports_database() {
    let (_dir, client) = client().await;
    let (status, body) = get(&client, "/api/health").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"]["status"], "OK");
    assert_eq!(body["data"]["database"], "ok");
}

#[rocket::async_test]
async fn post_and_fetch_jobs() {
    let (_dir, client) = client().await;

    let (status, created) = post(&client, "/api/jobs", job("Site driver", "driving", 700.0, "Pune")).await;
    assert_eq!(status, Status::Created);
    assert_eq!(created["type"], "action");
    let id = created["data"]["id"].as_i64().unwrap();

    post(&client, "/api/jobs", job("Gardener", "gardening", 500.0, "Delhi")).await;

    let (status, fetched) = get(&client, &format!("/api/jobs/{}", id)).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(fetched["data"]["title"], "Site driver");

    let (_, listed) = get(&client, "/api/jobs?skill=driv&location=pune").await;
    assert_eq!(listed["data"]["total"], 1);

    let (_, all) = get(&client, "/api/jobs?limit=1").await;
    assert_eq!(all["data"]["total"], 2);
    assert_eq!(all["data"]["pages"], 2);
    assert_eq!(all["data"]["jobs"].as_array().unwrap().len(), 1);

    let (_, insights) = get(&client, "/api/jobs/insights").await;
    assert_eq!(insights["data"]["total_jobs"], 2);
    assert_eq!(insights["data"]["average_wage"], 600);
}

#[rocket::async_test]
async fn search_box_uses_interpreter() {
    let (_dir, client) = client().await;
    post(&client, "/api/jobs", job("Driver", "driving", 700.0, "Pune")).await;
    post(&client, "/api/jobs", job("Driver", "driving", 650.0, "Mumbai")).await;

    let (status, body) = get(&client, "/api/jobs/search?q=driver%20jobs%20in%20pune").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"]["query"]["skills"], json!(["driving"]));
    assert_eq!(body["data"]["query"]["location"], "pune");
    assert_eq!(body["data"]["total"], 1);
}

#[rocket::async_test]
async fn interpret_endpoint() {
    let (_dir, client) = client().await;
    let (status, body) = get(&client, "/api/assistant/interpret?text=jobs%20of%20cooking%20in%20delhi").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"]["query"]["skills"], json!(["cook"]));
    assert_eq!(body["data"]["query"]["location"], "delhi");
    assert_eq!(body["data"]["skill_filter"], "cook");
}

#[rocket::async_test]
async fn chat_search_route() {
    let (_dir, client) = client().await;
    post(&client, "/api/jobs", job("Site driver", "driving", 700.0, "Pune")).await;

    let (status, body) = post(
        &client,
        "/api/assistant/chat",
        json!({ "message": "driver jobs in pune" }),
    )
    .await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"]["route"], "search");
    assert!(body["conversation_id"].as_str().is_some());

    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages[0], "🔍 Finding driving jobs in pune...");
    assert_eq!(
        messages[1],
        "⭐ Site driver at Pune (Wage: ₹700/day)\nSite driver needed urgently"
    );
}

#[rocket::async_test]
async fn chat_falls_back_to_recommendations() {
    let (_dir, client) = client().await;
    post(&client, "/api/jobs", job("Helper", "helper", 450.0, "Pune")).await;
    let (_, labourer) = post(
        &client,
        "/api/labourers",
        json!({ "name": "Sita", "skills": "helper", "experience": 2, "location": "Pune" }),
    )
    .await;
    let labourer_id = labourer["data"]["id"].as_i64().unwrap();

    let (_, body) = post(
        &client,
        "/api/assistant/chat",
        json!({ "message": "hello", "labourer_id": labourer_id, "conversation_id": "conv-42" }),
    )
    .await;
    assert_eq!(body["conversation_id"], "conv-42");
    assert_eq!(body["data"]["route"], "recommendation");
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages[0], "🔍 Searching best jobs for you...");
    assert_eq!(messages.len(), 2);
}

#[rocket::async_test]
async fn recommendations_and_applications() {
    let (_dir, client) = client().await;
    let (_, posted) = post(&client, "/api/jobs", job("Driver", "driving", 700.0, "Pune")).await;
    let job_id = posted["data"]["id"].as_i64().unwrap();
    let (status, labourer) = post(
        &client,
        "/api/labourers",
        json!({ "name": "Ravi", "skills": "driving", "experience": 5, "location": "Pune" }),
    )
    .await;
    assert_eq!(status, Status::Created);
    let labourer_id = labourer["data"]["id"].as_i64().unwrap();

    let (_, jobs) = get(&client, &format!("/api/recommendations/jobs/{}", labourer_id)).await;
    assert_eq!(jobs["data"]["total"], 1);
    assert_eq!(jobs["data"]["recommendations"][0]["match_score"], 0.8);
    assert_eq!(jobs["data"]["recommendations"][0]["title"], "Driver");

    let (_, labourers) = get(&client, &format!("/api/recommendations/labourers/{}", job_id)).await;
    assert_eq!(labourers["data"]["recommendations"][0]["name"], "Ravi");
    assert_eq!(labourers["data"]["recommendations"][0]["match_score"], 0.85);

    let uri = format!("/api/jobs/{}/apply", job_id);
    let (status, _) = post(&client, &uri, json!({ "labourer_id": labourer_id })).await;
    assert_eq!(status, Status::Ok);
    let (status, duplicate) = post(&client, &uri, json!({ "labourer_id": labourer_id })).await;
    assert_eq!(status, Status::Conflict);
    assert_eq!(duplicate["error_code"], "ALREADY_APPLIED");

    let (_, after) = get(&client, &format!("/api/recommendations/jobs/{}", labourer_id)).await;
    assert_eq!(after["data"]["total"], 0);
}

async fn send(client: &Client, method: Method, uri: &str, body: Option<Value>) -> (Status, Value) {
    let mut request = client.req(method, uri);
    if let Some(body) = body {
        request = request.header(ContentType::JSON).body(body.to_string());
    }
    let response = request.dispatch().await;
    let status = response.status();
    (status, response.into_json::<Value>().await.unwrap())
}

#[rocket::async_test]
async fn application_status_lifecycle() {
    let (_dir, client) = client().await;
    let (_, posted) = post(&client, "/api/jobs", job("Mason", "mason", 750.0, "Nagpur")).await;
    let job_id = posted["data"]["id"].as_i64().unwrap();
    let (_, labourer) = post(
        &client,
        "/api/labourers",
        json!({ "name": "Gopal", "skills": "mason", "experience": 6, "location": "Nagpur" }),
    )
    .await;
    let labourer_id = labourer["data"]["id"].as_i64().unwrap();

    let (_, applied) = post(
        &client,
        &format!("/api/jobs/{}/apply", job_id),
        json!({ "labourer_id": labourer_id }),
    )
    .await;
    assert_eq!(applied["data"]["status"], "PENDING");
    let application_id = applied["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/applications/{}", application_id);
    let (status, accepted) = send(&client, Method::Patch, &uri, Some(json!({ "status": "ACCEPTED" }))).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(accepted["data"]["status"], "ACCEPTED");

    let (status, _) = send(&client, Method::Patch, &uri, Some(json!({ "status": "HIRED" }))).await;
    assert_eq!(status, Status::UnprocessableEntity);

    let (status, _) = send(
        &client,
        Method::Patch,
        "/api/applications/999",
        Some(json!({ "status": "REJECTED" })),
    )
    .await;
    assert_eq!(status, Status::NotFound);

    let (_, mine) = get(&client, &format!("/api/labourers/{}/applications", labourer_id)).await;
    assert_eq!(mine["data"]["total"], 1);
    assert_eq!(mine["data"]["applications"][0]["status"], "ACCEPTED");

    let (_, received) = get(&client, &format!("/api/jobs/{}/applications", job_id)).await;
    assert_eq!(received["data"]["applications"][0]["labourer_id"], labourer_id);

    let (status, _) = get(&client, "/api/labourers/999/applications").await;
    assert_eq!(status, Status::NotFound);
}

#[rocket::async_test]
async fn update_and_delete_job() {
    let (_dir, client) = client().await;
    let (_, posted) = post(&client, "/api/jobs", job("Cook", "cook", 550.0, "Thane")).await;
    let uri = format!("/api/jobs/{}", posted["data"]["id"].as_i64().unwrap());

    let (status, updated) = send(
        &client,
        Method::Put,
        &uri,
        Some(job("Head cook", "cook", 650.0, "Thane")),
    )
    .await;
    assert_eq!(status, Status::Ok);
    assert_eq!(updated["data"]["title"], "Head cook");
    assert_eq!(updated["action"], "job_updated");

    let (status, invalid) = send(&client, Method::Put, &uri, Some(job("Head cook", "cook", -1.0, "Thane"))).await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(invalid["error_code"], "VALIDATION_ERROR");

    let (status, _) = send(&client, Method::Delete, &uri, None).await;
    assert_eq!(status, Status::Ok);
    let (status, _) = get(&client, &uri).await;
    assert_eq!(status, Status::NotFound);
    let (status, _) = send(&client, Method::Delete, &uri, None).await;
    assert_eq!(status, Status::NotFound);
}

#[rocket::async_test]
async fn errors_use_standard_envelope() {
    let (_dir, client) = client().await;

    let (status, missing) = get(&client, "/api/jobs/999").await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(missing["error_code"], "NOT_FOUND");
    assert_eq!(missing["success"], false);

    let (status, invalid) = post(&client, "/api/jobs", job("Free", "cleaning", 0.0, "Agra")).await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(invalid["error_code"], "VALIDATION_ERROR");

    let (status, malformed) = post(&client, "/api/jobs", json!({ "title": "Only a title" })).await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(malformed["type"], "error");

    let (status, unknown) = get(&client, "/api/nowhere").await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(unknown["error_code"], "NOT_FOUND");

    let (status, _) = get(&client, "/api/recommendations/jobs/77").await;
    assert_eq!(status, Status::NotFound);
}

#[rocket::async_test]
async fn cors_headers_and_preflight() {
    let (_dir, client) = client().await;
    let response = client.options("/api/jobs").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );
}
