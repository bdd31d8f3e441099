//! Solutions service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::solutions::{
        data::NewSolution,
        errors::SolutionsServiceError,
        records::{SolutionRecord, SolutionUuid},
        repository::PgSolutionsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgSolutionsService {
    db: Db,
    repository: PgSolutionsRepository,
}

impl PgSolutionsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgSolutionsRepository::new(),
        }
    }
}

#[async_trait]
impl SolutionsService for PgSolutionsService {
    async fn list_solutions(&self) -> Result<Vec<SolutionRecord>, SolutionsServiceError> {
        let mut tx = self.db.begin().await?;

        let solutions = self.repository.list_solutions(&mut tx).await?;

        tx.commit().await?;

        Ok(solutions)
    }

    async fn get_solution(
        &self,
        solution: SolutionUuid,
    ) -> Result<SolutionRecord, SolutionsServiceError> {
        let mut tx = self.db.begin().await?;

        let solution = self.repository.get_solution(&mut tx, solution).await?;

        tx.commit().await?;

        Ok(solution)
    }

    #[tracing::instrument(
        name = "solutions.service.create_solution",
        skip(self, solution),
        fields(solution_uuid = %solution.uuid),
        err
    )]
    async fn create_solution(
        &self,
        solution: NewSolution,
    ) -> Result<SolutionRecord, SolutionsServiceError> {
        if solution.title.trim().is_empty() {
            return Err(SolutionsServiceError::MissingRequiredData);
        }

        if solution.price.is_sign_negative() {
            return Err(SolutionsServiceError::InvalidData);
        }

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_solution(&mut tx, solution).await?;

        tx.commit().await?;

        info!(solution_uuid = %created.uuid, price = %created.price, "created solution");

        Ok(created)
    }
}

#[automock]
#[async_trait]
pub trait SolutionsService: Send + Sync {
    /// Retrieves all solutions, newest first.
    async fn list_solutions(&self) -> Result<Vec<SolutionRecord>, SolutionsServiceError>;

    /// Retrieve a single solution.
    async fn get_solution(
        &self,
        solution: SolutionUuid,
    ) -> Result<SolutionRecord, SolutionsServiceError>;

    /// Creates a new solution.
    async fn create_solution(
        &self,
        solution: NewSolution,
    ) -> Result<SolutionRecord, SolutionsServiceError>;
}
