//! Fine ledger service

use crate::{
    error::AppResult,
    models::fine::{FineQuery, FineRecord},
    repository::Repository,
};

#[derive(Clone)]
pub struct FinesService {
    repository: Repository,
}

impl FinesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List fines (admin views)
    pub async fn list_fines(&self, query: &FineQuery) -> AppResult<(Vec<FineRecord>, i64)> {
        self.repository.fines.list(query).await
    }

    /// List fines for one user
    pub async fn list_user_fines(&self, user_id: i32) -> AppResult<Vec<FineRecord>> {
        self.repository.fines.list_for_user(user_id).await
    }

    /// Get fine by ID
    pub async fn get_fine(&self, id: i32) -> AppResult<FineRecord> {
        self.repository.fines.get_by_id(id).await
    }

    /// Settle a fine as paid
    pub async fn pay(&self, id: i32) -> AppResult<FineRecord> {
        let fine = self.repository.fines.mark_paid(id).await?;
        tracing::info!(fine_id = id, amount = %fine.amount, "fine paid");
        Ok(fine)
    }

    /// Waive a fine (librarian decision)
    pub async fn waive(&self, id: i32) -> AppResult<FineRecord> {
        let fine = self.repository.fines.waive(id).await?;
        tracing::info!(fine_id = id, amount = %fine.amount, "fine waived");
        Ok(fine)
    }
}
