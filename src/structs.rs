use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `user` table. The password is stored as received.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub password: String,
}

/// A row of the `test` table.
///
/// `created_by` only exists in the admin schema; rows read from the results
/// schema leave it `None`.
#[derive(Debug, Clone, FromRow)]
pub struct Test {
    pub test_id: i64,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(default)]
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TestResult {
    pub result_id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub score: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize, Debug)]
pub struct UserPayload {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct NewTest {
    pub title: String,
    pub description: Option<String>,
    pub created_by: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct TestUpdate {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct NewResult {
    pub user_id: i64,
    pub test_id: i64,
    pub score: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub user_id: i64,
    pub email: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        UserSummary {
            user_id: user.user_id,
            email: user.email,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TestSummary {
    pub test_id: i64,
    pub title: String,
    pub description: Option<String>,
}

impl From<Test> for TestSummary {
    fn from(test: Test) -> Self {
        TestSummary {
            test_id: test.test_id,
            title: test.title,
            description: test.description,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub result_id: i64,
    pub test_id: i64,
    pub score: f64,
    pub created_at: NaiveDateTime,
}

impl From<TestResult> for ResultSummary {
    fn from(result: TestResult) -> Self {
        ResultSummary {
            result_id: result.result_id,
            test_id: result.test_id,
            score: result.score,
            created_at: result.created_at,
        }
    }
}
