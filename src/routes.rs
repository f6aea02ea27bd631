use actix_web::{
    delete,
    error::InternalError,
    get,
    http::Method,
    post, put,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde_json::json;

use crate::{
    db,
    errors::AppError,
    structs::{NewResult, NewTest, ResultSummary, TestSummary, TestUpdate, UserPayload, UserSummary},
    AppState,
};

/// Bodies that fail to deserialize are answered with a JSON 400 instead of
/// actix's plain-text default.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected request body: {}", err);
        AppError::from(err).into()
    })
}

/// A non-numeric id in the path is answered like any unknown resource.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::NotFound().json(message("Not found"));
        InternalError::from_response(err, response).into()
    })
}

/// Users and tests with full CRUD.
pub fn admin(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(create_user_handler)
        .service(list_users_handler)
        .service(update_user_handler)
        .service(delete_user_handler)
        .service(create_owned_test_handler)
        .service(list_tests_handler)
        .service(update_test_handler)
        .service(delete_test_handler);
    method_fallbacks(cfg, &["/users", "/users/{id}", "/tests", "/tests/{id}"]);
}

/// Test create/list plus result recording.
pub fn results(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(create_test_handler)
        .service(list_tests_handler)
        .service(save_result_handler)
        .service(list_results_handler);
    method_fallbacks(cfg, &["/tests", "/results", "/results/{user_id}"]);
}

/// Registered after the routed handlers: a known path reached with a verb no
/// handler claims answers 405, while unknown paths fall through to 404.
fn method_fallbacks(cfg: &mut web::ServiceConfig, paths: &[&str]) {
    for path in paths {
        cfg.service(web::resource(*path).to(method_not_allowed));
    }
}

async fn method_not_allowed(req_method: Method) -> HttpResponse {
    log::debug!("No {} handler for this path", req_method);
    HttpResponse::MethodNotAllowed().json(message("Method not allowed"))
}

fn message(text: &str) -> serde_json::Value {
    json!({ "message": text })
}

#[post("/users")]
pub async fn create_user_handler(
    state: Data<AppState>,
    web::Json(body): web::Json<UserPayload>,
) -> Result<impl Responder, AppError> {
    db::create_user(&state, body.email, body.password).await?;
    Ok(HttpResponse::Created().json(message("User created")))
}

#[get("/users")]
pub async fn list_users_handler(state: Data<AppState>) -> Result<impl Responder, AppError> {
    let users: Vec<UserSummary> = db::get_all_users(&state)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[put("/users/{id}")]
pub async fn update_user_handler(
    state: Data<AppState>,
    id: web::Path<i64>,
    web::Json(body): web::Json<UserPayload>,
) -> Result<impl Responder, AppError> {
    let mut user = db::get_user_by_id(&state, id.into_inner())
        .await?
        .ok_or(AppError::UserNotFound)?;
    user.email = body.email;
    user.password = body.password;
    db::update_user(&state, &user).await?;
    Ok(HttpResponse::Ok().json(message("User updated")))
}

#[delete("/users/{id}")]
pub async fn delete_user_handler(
    state: Data<AppState>,
    id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let user = db::get_user_by_id(&state, id.into_inner())
        .await?
        .ok_or(AppError::UserNotFound)?;
    db::delete_user(&state, &user).await?;
    Ok(HttpResponse::Ok().json(message("User deleted")))
}

#[post("/tests")]
pub async fn create_owned_test_handler(
    state: Data<AppState>,
    web::Json(body): web::Json<NewTest>,
) -> Result<impl Responder, AppError> {
    db::create_owned_test(&state, body.title, body.description, body.created_by).await?;
    Ok(HttpResponse::Created().json(message("Test created")))
}

/// The results schema has no `created_by` column, so any creator sent here is ignored.
#[post("/tests")]
pub async fn create_test_handler(
    state: Data<AppState>,
    web::Json(body): web::Json<NewTest>,
) -> Result<impl Responder, AppError> {
    if let Some(created_by) = body.created_by {
        log::debug!("Ignoring created_by={} on results service", created_by);
    }
    db::create_test(&state, body.title, body.description).await?;
    Ok(HttpResponse::Created().json(message("Test created")))
}

#[get("/tests")]
pub async fn list_tests_handler(state: Data<AppState>) -> Result<impl Responder, AppError> {
    let tests: Vec<TestSummary> = db::get_all_tests(&state)
        .await?
        .into_iter()
        .map(TestSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(tests))
}

#[put("/tests/{id}")]
pub async fn update_test_handler(
    state: Data<AppState>,
    id: web::Path<i64>,
    web::Json(body): web::Json<TestUpdate>,
) -> Result<impl Responder, AppError> {
    let mut test = db::get_test_by_id(&state, id.into_inner())
        .await?
        .ok_or(AppError::TestNotFound)?;
    test.title = body.title;
    test.description = body.description;
    db::update_test(&state, &test).await?;
    Ok(HttpResponse::Ok().json(message("Test updated")))
}

#[delete("/tests/{id}")]
pub async fn delete_test_handler(
    state: Data<AppState>,
    id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let test = db::get_test_by_id(&state, id.into_inner())
        .await?
        .ok_or(AppError::TestNotFound)?;
    db::delete_test(&state, &test).await?;
    Ok(HttpResponse::Ok().json(message("Test deleted")))
}

#[post("/results")]
pub async fn save_result_handler(
    state: Data<AppState>,
    web::Json(body): web::Json<NewResult>,
) -> Result<impl Responder, AppError> {
    db::create_result(&state, body.user_id, body.test_id, body.score).await?;
    Ok(HttpResponse::Created().json(message("Result saved")))
}

#[get("/results/{user_id}")]
pub async fn list_results_handler(
    state: Data<AppState>,
    user_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let results: Vec<ResultSummary> = db::get_results_by_user_id(&state, user_id.into_inner())
        .await?
        .into_iter()
        .map(ResultSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(results))
}

/// Fallback for paths no route claims.
pub async fn default_handler() -> HttpResponse {
    HttpResponse::NotFound().json(message("Not found"))
}
