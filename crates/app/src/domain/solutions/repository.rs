//! Solutions Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::solutions::{
    data::NewSolution,
    records::{SolutionRecord, SolutionUuid},
};

const LIST_SOLUTIONS_SQL: &str = include_str!("sql/list_solutions.sql");
const GET_SOLUTION_SQL: &str = include_str!("sql/get_solution.sql");
const CREATE_SOLUTION_SQL: &str = include_str!("sql/create_solution.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSolutionsRepository;

impl PgSolutionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_solutions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<SolutionRecord>, sqlx::Error> {
        query_as::<Postgres, SolutionRecord>(LIST_SOLUTIONS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_solution(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        solution: SolutionUuid,
    ) -> Result<SolutionRecord, sqlx::Error> {
        query_as::<Postgres, SolutionRecord>(GET_SOLUTION_SQL)
            .bind(solution.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_solution(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        solution: NewSolution,
    ) -> Result<SolutionRecord, sqlx::Error> {
        query_as::<Postgres, SolutionRecord>(CREATE_SOLUTION_SQL)
            .bind(solution.uuid.into_uuid())
            .bind(solution.title)
            .bind(solution.description)
            .bind(solution.price)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for SolutionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: SolutionUuid::from_uuid(row.try_get("uuid")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
