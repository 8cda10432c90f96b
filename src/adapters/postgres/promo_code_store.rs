//! PostgreSQL implementation of PromoCodeStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{Discount, DiscountKind, DiscountScope, PromoCode};
use crate::domain::foundation::{DomainError, PromoCodeId, Timestamp};
use crate::ports::{DeleteOutcome, InsertOutcome, PromoCodeStore};

/// PostgreSQL implementation of the PromoCodeStore port.
///
/// The redemption guard (`increment_uses`) is a single conditional UPDATE,
/// which is what makes two concurrent redemptions unable to jointly exceed
/// `max_uses`.
pub struct PostgresPromoCodeStore {
    pool: PgPool,
}

impl PostgresPromoCodeStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a promo code.
#[derive(Debug, sqlx::FromRow)]
struct PromoCodeRow {
    id: Uuid,
    code: String,
    partner_name: String,
    partner_email: String,
    discount_kind: String,
    discount_value: i64,
    applies_to: String,
    max_uses: Option<i32>,
    uses_count: i32,
    expires_at: Option<DateTime<Utc>>,
    active: bool,
    created_at: DateTime<Utc>,
}

fn parse_discount_kind(s: &str) -> Result<DiscountKind, DomainError> {
    match s {
        "percent" => Ok(DiscountKind::Percent),
        "fixed_amount" => Ok(DiscountKind::FixedAmount),
        _ => Err(DomainError::database(format!(
            "Invalid discount kind: {}",
            s
        ))),
    }
}

fn discount_kind_to_string(kind: DiscountKind) -> &'static str {
    match kind {
        DiscountKind::Percent => "percent",
        DiscountKind::FixedAmount => "fixed_amount",
    }
}

fn parse_scope(s: &str) -> Result<DiscountScope, DomainError> {
    match s {
        "all" => Ok(DiscountScope::All),
        "premium" => Ok(DiscountScope::Premium),
        "super_premium" => Ok(DiscountScope::SuperPremium),
        _ => Err(DomainError::database(format!("Invalid scope: {}", s))),
    }
}

fn scope_to_string(scope: DiscountScope) -> &'static str {
    match scope {
        DiscountScope::All => "all",
        DiscountScope::Premium => "premium",
        DiscountScope::SuperPremium => "super_premium",
    }
}

impl TryFrom<PromoCodeRow> for PromoCode {
    type Error = DomainError;

    fn try_from(row: PromoCodeRow) -> Result<Self, Self::Error> {
        Ok(PromoCode {
            id: PromoCodeId::from_uuid(row.id),
            code: row.code,
            partner_name: row.partner_name,
            partner_email: row.partner_email,
            discount: Discount {
                kind: parse_discount_kind(&row.discount_kind)?,
                value: row.discount_value,
            },
            applies_to: parse_scope(&row.applies_to)?,
            max_uses: row.max_uses.map(|n| n as u32),
            uses_count: row.uses_count as u32,
            expires_at: row.expires_at.map(Timestamp::from_datetime),
            active: row.active,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, code, partner_name, partner_email, discount_kind, discount_value,
           applies_to, max_uses, uses_count, expires_at, active, created_at
    FROM promo_codes
"#;

#[async_trait]
impl PromoCodeStore for PostgresPromoCodeStore {
    async fn create(&self, code: &PromoCode) -> Result<InsertOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO promo_codes (
                id, code, partner_name, partner_email, discount_kind, discount_value,
                applies_to, max_uses, uses_count, expires_at, active, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code.id.as_uuid())
        .bind(&code.code)
        .bind(&code.partner_name)
        .bind(&code.partner_email)
        .bind(discount_kind_to_string(code.discount.kind))
        .bind(code.discount.value)
        .bind(scope_to_string(code.applies_to))
        .bind(code.max_uses.map(|n| n as i32))
        .bind(code.uses_count as i32)
        .bind(code.expires_at.map(|t| *t.as_datetime()))
        .bind(code.active)
        .bind(code.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to create promo code: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError> {
        // Codes are stored normalized (uppercase); UPPER on the input makes
        // the lookup case-insensitive regardless.
        let row: Option<PromoCodeRow> =
            sqlx::query_as(&format!("{} WHERE code = UPPER(TRIM($1))", SELECT_COLUMNS))
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find promo code: {}", e)))?;

        row.map(PromoCode::try_from).transpose()
    }

    async fn find_by_id(&self, id: &PromoCodeId) -> Result<Option<PromoCode>, DomainError> {
        let row: Option<PromoCodeRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find promo code: {}", e)))?;

        row.map(PromoCode::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<PromoCode>, DomainError> {
        let rows: Vec<PromoCodeRow> =
            sqlx::query_as(&format!("{} ORDER BY created_at DESC", SELECT_COLUMNS))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to list promo codes: {}", e)))?;

        rows.into_iter().map(PromoCode::try_from).collect()
    }

    async fn set_active(&self, id: &PromoCodeId, active: bool) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE promo_codes SET active = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to update promo code: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_uses(&self, id: &PromoCodeId) -> Result<bool, DomainError> {
        // Check-and-increment in one statement: the WHERE clause re-checks
        // the cap against the row's current value, so losers of a race see
        // zero rows affected instead of pushing the count past max_uses.
        let result = sqlx::query(
            r#"
            UPDATE promo_codes
            SET uses_count = uses_count + 1
            WHERE id = $1
              AND (max_uses IS NULL OR uses_count < max_uses)
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to redeem promo code: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &PromoCodeId) -> Result<DeleteOutcome, DomainError> {
        let result = sqlx::query("DELETE FROM promo_codes WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(DeleteOutcome::NotFound),
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(e) => {
                // The RESTRICT foreign key from affiliate_earnings blocks
                // deleting a referenced partner.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.constraint() == Some("affiliate_earnings_promo_code_id_fkey") {
                        return Ok(DeleteOutcome::InUse);
                    }
                }
                Err(DomainError::database(format!(
                    "Failed to delete promo code: {}",
                    e
                )))
            }
        }
    }
}
