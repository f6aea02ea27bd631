use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};

use crate::{
    errors::AppError,
    structs::{Test, TestResult, User},
    AppState, Service,
};

/// Opens the pool. Foreign keys stay declared in the schema but are not
/// enforced, so results may point at users and tests that do not exist.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(false)
        .read_only(false)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePool::connect_with(opts).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool, service: Service) -> Result<(), AppError> {
    service.migrator().run(pool).await?;
    log::info!("{} schema migrated", service.name());
    Ok(())
}

pub async fn get_all_users(state: &AppState) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT user_id, email, password FROM user ORDER BY user_id",
    )
    .fetch_all(&state.db_pool)
    .await?;
    Ok(users)
}

pub async fn get_user_by_id(state: &AppState, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT user_id, email, password FROM user WHERE user_id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?;
    Ok(user)
}

pub async fn create_user(
    state: &AppState,
    email: String,
    password: String,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO user (email, password) VALUES (?, ?) RETURNING user_id, email, password",
    )
    .bind(email)
    .bind(password)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| {
        log::error!("Failed to create user: {}", e);
        AppError::DatabaseError(e)
    })?;
    log::info!("User created: id={} email={}", user.user_id, user.email);
    Ok(user)
}

pub async fn update_user(state: &AppState, user: &User) -> Result<(), AppError> {
    sqlx::query("UPDATE user SET email = ?, password = ? WHERE user_id = ?")
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.user_id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update user {}: {}", user.user_id, e);
            AppError::DatabaseError(e)
        })?;
    log::info!("User with id {} updated", user.user_id);
    Ok(())
}

pub async fn delete_user(state: &AppState, user: &User) -> Result<(), AppError> {
    sqlx::query("DELETE FROM user WHERE user_id = ?")
        .bind(user.user_id)
        .execute(&state.db_pool)
        .await?;
    log::info!("User with id {} deleted", user.user_id);
    Ok(())
}

pub async fn get_all_tests(state: &AppState) -> Result<Vec<Test>, AppError> {
    let tests = sqlx::query_as::<_, Test>(
        "SELECT test_id, title, description FROM test ORDER BY test_id",
    )
    .fetch_all(&state.db_pool)
    .await?;
    Ok(tests)
}

/// Admin schema only: reads `created_by` as well.
pub async fn get_test_by_id(state: &AppState, id: i64) -> Result<Option<Test>, AppError> {
    let test = sqlx::query_as::<_, Test>(
        "SELECT test_id, title, description, created_by FROM test WHERE test_id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?;
    Ok(test)
}

pub async fn create_test(
    state: &AppState,
    title: String,
    description: Option<String>,
) -> Result<Test, AppError> {
    let test = sqlx::query_as::<_, Test>(
        "INSERT INTO test (title, description) VALUES (?, ?) RETURNING test_id, title, description",
    )
    .bind(title)
    .bind(description)
    .fetch_one(&state.db_pool)
    .await?;
    log::info!("Test created: id={} title={}", test.test_id, test.title);
    Ok(test)
}

/// Admin schema only: records the creating user alongside the test.
pub async fn create_owned_test(
    state: &AppState,
    title: String,
    description: Option<String>,
    created_by: Option<i64>,
) -> Result<Test, AppError> {
    let test = sqlx::query_as::<_, Test>(
        "INSERT INTO test (title, description, created_by) VALUES (?, ?, ?) \
         RETURNING test_id, title, description, created_by",
    )
    .bind(title)
    .bind(description)
    .bind(created_by)
    .fetch_one(&state.db_pool)
    .await?;
    log::info!(
        "Test created: id={} title={} created_by={:?}",
        test.test_id,
        test.title,
        test.created_by
    );
    Ok(test)
}

pub async fn update_test(state: &AppState, test: &Test) -> Result<(), AppError> {
    sqlx::query("UPDATE test SET title = ?, description = ? WHERE test_id = ?")
        .bind(&test.title)
        .bind(&test.description)
        .bind(test.test_id)
        .execute(&state.db_pool)
        .await?;
    log::info!("Test with id {} updated", test.test_id);
    Ok(())
}

pub async fn delete_test(state: &AppState, test: &Test) -> Result<(), AppError> {
    sqlx::query("DELETE FROM test WHERE test_id = ?")
        .bind(test.test_id)
        .execute(&state.db_pool)
        .await?;
    log::info!("Test with id {} deleted", test.test_id);
    Ok(())
}

pub async fn create_result(
    state: &AppState,
    user_id: i64,
    test_id: i64,
    score: f64,
) -> Result<TestResult, AppError> {
    let result = sqlx::query_as::<_, TestResult>(
        "INSERT INTO result (user_id, test_id, score) VALUES (?, ?, ?) \
         RETURNING result_id, user_id, test_id, score, created_at",
    )
    .bind(user_id)
    .bind(test_id)
    .bind(score)
    .fetch_one(&state.db_pool)
    .await?;
    log::info!(
        "Result saved: id={} user_id={} test_id={} score={}",
        result.result_id,
        result.user_id,
        result.test_id,
        result.score
    );
    Ok(result)
}

pub async fn get_results_by_user_id(
    state: &AppState,
    user_id: i64,
) -> Result<Vec<TestResult>, AppError> {
    let results = sqlx::query_as::<_, TestResult>(
        "SELECT result_id, user_id, test_id, score, created_at FROM result \
         WHERE user_id = ? ORDER BY result_id",
    )
    .bind(user_id)
    .fetch_all(&state.db_pool)
    .await?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn state_for(service: Service) -> AppState {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(false);
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .unwrap();
        migrate(&db_pool, service).await.unwrap();
        AppState { db_pool }
    }

    #[tokio::test]
    async fn migrations_can_run_twice() {
        let state = state_for(Service::Admin).await;
        migrate(&state.db_pool, Service::Admin).await.unwrap();
        assert!(get_all_users(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_the_store() {
        let state = state_for(Service::Admin).await;
        create_user(&state, "a@example.com".into(), "pw".into()).await.unwrap();

        let err = create_user(&state, "a@example.com".into(), "other".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert_eq!(get_all_users(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_persists_loaded_row() {
        let state = state_for(Service::Admin).await;
        let mut user = create_user(&state, "old@example.com".into(), "pw".into()).await.unwrap();
        user.email = "new@example.com".into();
        user.password = "secret".into();
        update_user(&state, &user).await.unwrap();

        let stored = get_user_by_id(&state, user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.email, "new@example.com");
        assert_eq!(stored.password, "secret");
    }

    #[tokio::test]
    async fn owned_test_keeps_creator_without_checking_it() {
        let state = state_for(Service::Admin).await;
        let test = create_owned_test(&state, "Career".into(), None, Some(42)).await.unwrap();
        assert_eq!(test.created_by, Some(42));

        let loaded = get_test_by_id(&state, test.test_id).await.unwrap().unwrap();
        assert_eq!(loaded.created_by, Some(42));
        assert_eq!(loaded.description, None);

        delete_test(&state, &loaded).await.unwrap();
        assert!(get_test_by_id(&state, test.test_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn results_schema_tests_have_no_creator() {
        let state = state_for(Service::Results).await;
        create_test(&state, "Logic".into(), Some("Puzzles".into())).await.unwrap();

        let tests = get_all_tests(&state).await.unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].created_by, None);
        assert_eq!(tests[0].description.as_deref(), Some("Puzzles"));
    }

    #[tokio::test]
    async fn results_are_filtered_by_user() {
        let state = state_for(Service::Results).await;
        create_result(&state, 1, 10, 85.0).await.unwrap();
        create_result(&state, 2, 10, 40.5).await.unwrap();
        create_result(&state, 1, 11, 90.0).await.unwrap();

        let results = get_results_by_user_id(&state, 1).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.user_id == 1));
        assert_eq!(results[0].test_id, 10);
        assert_eq!(results[1].score, 90.0);

        assert!(get_results_by_user_id(&state, 99).await.unwrap().is_empty());
    }
}
