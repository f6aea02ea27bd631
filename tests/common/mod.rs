use std::str::FromStr;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web::{self, Data},
    App,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use user_testing::{db, routes, AppState, Service};

/// Fresh in-memory store, migrated for `service`. A single connection keeps
/// the database alive for the whole test.
pub async fn state_for(service: Service) -> AppState {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory url")
        .foreign_keys(false);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
        .expect("open in-memory sqlite");
    db::migrate(&db_pool, service).await.expect("migrate");
    AppState { db_pool }
}

pub fn app(
    service: Service,
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(Data::new(state))
        .configure(move |cfg| service.configure(cfg))
        .default_service(web::to(routes::default_handler))
}
