//! In-memory implementation of PromoCodeStore.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::PromoCode;
use crate::domain::foundation::{DomainError, PromoCodeId};
use crate::ports::{DeleteOutcome, InsertOutcome, PromoCodeStore};

/// In-memory promo code registry.
///
/// The uses-count check-and-increment runs under the store mutex, mirroring
/// the single conditional UPDATE of the PostgreSQL adapter.
#[derive(Default)]
pub struct InMemoryPromoCodeStore {
    codes: Mutex<Vec<PromoCode>>,
}

impl InMemoryPromoCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one code.
    pub fn with_code(code: PromoCode) -> Self {
        Self {
            codes: Mutex::new(vec![code]),
        }
    }

    /// Snapshot of all codes, for assertions.
    pub fn codes(&self) -> Vec<PromoCode> {
        self.codes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PromoCodeStore for InMemoryPromoCodeStore {
    async fn create(&self, code: &PromoCode) -> Result<InsertOutcome, DomainError> {
        let mut codes = self.codes.lock().unwrap();
        if codes
            .iter()
            .any(|c| c.code.eq_ignore_ascii_case(&code.code))
        {
            return Ok(InsertOutcome::AlreadyExists);
        }
        codes.push(code.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError> {
        let codes = self.codes.lock().unwrap();
        Ok(codes
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
            .cloned())
    }

    async fn find_by_id(&self, id: &PromoCodeId) -> Result<Option<PromoCode>, DomainError> {
        let codes = self.codes.lock().unwrap();
        Ok(codes.iter().find(|c| &c.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<PromoCode>, DomainError> {
        let mut codes = self.codes.lock().unwrap().clone();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(codes)
    }

    async fn set_active(&self, id: &PromoCodeId, active: bool) -> Result<bool, DomainError> {
        let mut codes = self.codes.lock().unwrap();
        match codes.iter_mut().find(|c| &c.id == id) {
            Some(code) => {
                code.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_uses(&self, id: &PromoCodeId) -> Result<bool, DomainError> {
        let mut codes = self.codes.lock().unwrap();
        match codes.iter_mut().find(|c| &c.id == id) {
            Some(code) => {
                if !code.has_uses_remaining() {
                    return Ok(false);
                }
                code.uses_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &PromoCodeId) -> Result<DeleteOutcome, DomainError> {
        let mut codes = self.codes.lock().unwrap();
        let before = codes.len();
        codes.retain(|c| &c.id != id);
        if codes.len() == before {
            Ok(DeleteOutcome::NotFound)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }
}
