//! PostgreSQL implementation of EarningsLedger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::billing::{AffiliateEarning, EarningStatus, SubscriptionTier};
use crate::domain::foundation::{DomainError, EarningId, PromoCodeId, Timestamp, UserId};
use crate::ports::{EarningsLedger, InsertOutcome, PartnerTotals, PayoutClaim, PayoutDetails};

/// PostgreSQL implementation of the EarningsLedger port.
///
/// Idempotency rests on the unique index over `invoice_id`: the insert uses
/// `ON CONFLICT DO NOTHING` and reports `AlreadyExists` on zero affected
/// rows. The payout claim is a single conditional UPDATE over
/// `status = 'pending'`, so racing payouts partition the rows instead of
/// double-claiming them.
pub struct PostgresEarningsLedger {
    pool: PgPool,
}

impl PostgresEarningsLedger {
    /// Creates a new ledger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an affiliate earning.
#[derive(Debug, sqlx::FromRow)]
struct EarningRow {
    id: Uuid,
    promo_code_id: Uuid,
    referred_user_id: String,
    invoice_id: String,
    payment_reference: Option<String>,
    amount_paid: i64,
    commission_rate: f64,
    commission_amount: i64,
    tier: String,
    status: String,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    payout_method: Option<String>,
    payout_reference: Option<String>,
    payout_notes: Option<String>,
}

impl TryFrom<EarningRow> for AffiliateEarning {
    type Error = DomainError;

    fn try_from(row: EarningRow) -> Result<Self, Self::Error> {
        let tier = SubscriptionTier::parse(&row.tier)
            .ok_or_else(|| DomainError::database(format!("Invalid tier value: {}", row.tier)))?;
        let status = EarningStatus::parse(&row.status).ok_or_else(|| {
            DomainError::database(format!("Invalid earning status: {}", row.status))
        })?;
        let referred_user_id = UserId::new(row.referred_user_id)
            .map_err(|e| DomainError::database(format!("Invalid user_id: {}", e)))?;

        Ok(AffiliateEarning {
            id: EarningId::from_uuid(row.id),
            promo_code_id: PromoCodeId::from_uuid(row.promo_code_id),
            referred_user_id,
            invoice_id: row.invoice_id,
            payment_reference: row.payment_reference,
            amount_paid: row.amount_paid,
            commission_rate: row.commission_rate,
            commission_amount: row.commission_amount,
            tier,
            status,
            created_at: Timestamp::from_datetime(row.created_at),
            paid_at: row.paid_at.map(Timestamp::from_datetime),
            payout_method: row.payout_method,
            payout_reference: row.payout_reference,
            payout_notes: row.payout_notes,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, promo_code_id, referred_user_id, invoice_id, payment_reference,
           amount_paid, commission_rate, commission_amount, tier, status,
           created_at, paid_at, payout_method, payout_reference, payout_notes
    FROM affiliate_earnings
"#;

#[async_trait]
impl EarningsLedger for PostgresEarningsLedger {
    async fn insert(&self, earning: &AffiliateEarning) -> Result<InsertOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO affiliate_earnings (
                id, promo_code_id, referred_user_id, invoice_id, payment_reference,
                amount_paid, commission_rate, commission_amount, tier, status,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (invoice_id) DO NOTHING
            "#,
        )
        .bind(earning.id.as_uuid())
        .bind(earning.promo_code_id.as_uuid())
        .bind(earning.referred_user_id.as_str())
        .bind(&earning.invoice_id)
        .bind(&earning.payment_reference)
        .bind(earning.amount_paid)
        .bind(earning.commission_rate)
        .bind(earning.commission_amount)
        .bind(earning.tier.as_str())
        .bind(earning.status.as_str())
        .bind(earning.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert earning: {}", e)))?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn list_for_partner(
        &self,
        promo_code_id: &PromoCodeId,
    ) -> Result<Vec<AffiliateEarning>, DomainError> {
        let rows: Vec<EarningRow> = sqlx::query_as(&format!(
            "{} WHERE promo_code_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(promo_code_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list earnings: {}", e)))?;

        rows.into_iter().map(AffiliateEarning::try_from).collect()
    }

    async fn mark_paid(
        &self,
        promo_code_id: &PromoCodeId,
        paid_at: Timestamp,
        details: &PayoutDetails,
    ) -> Result<PayoutClaim, DomainError> {
        // One conditional UPDATE claims and stamps every pending row. A
        // concurrent payout for the same partner serializes behind the row
        // locks and then matches nothing.
        let rows = sqlx::query(
            r#"
            UPDATE affiliate_earnings
            SET status = 'paid',
                paid_at = $2,
                payout_method = $3,
                payout_reference = $4,
                payout_notes = $5
            WHERE promo_code_id = $1
              AND status = 'pending'
            RETURNING commission_amount
            "#,
        )
        .bind(promo_code_id.as_uuid())
        .bind(paid_at.as_datetime())
        .bind(&details.method)
        .bind(&details.reference)
        .bind(&details.notes)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark earnings paid: {}", e)))?;

        let mut claim = PayoutClaim {
            entries: 0,
            total_commission: 0,
        };
        for row in rows {
            claim.entries += 1;
            claim.total_commission += row
                .try_get::<i64, _>("commission_amount")
                .map_err(|e| DomainError::database(format!("Bad payout row: {}", e)))?;
        }

        Ok(claim)
    }

    async fn has_entries_for(&self, promo_code_id: &PromoCodeId) -> Result<bool, DomainError> {
        let row =
            sqlx::query("SELECT EXISTS(SELECT 1 FROM affiliate_earnings WHERE promo_code_id = $1)")
                .bind(promo_code_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to check earnings: {}", e)))?;

        row.try_get::<bool, _>(0)
            .map_err(|e| DomainError::database(format!("Bad exists row: {}", e)))
    }

    async fn totals_by_partner(&self) -> Result<Vec<PartnerTotals>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT promo_code_id,
                   COUNT(*) AS conversions,
                   COALESCE(SUM(amount_paid), 0)::BIGINT AS revenue,
                   COALESCE(SUM(commission_amount) FILTER (WHERE status = 'pending'), 0)::BIGINT
                       AS commission_pending,
                   COALESCE(SUM(commission_amount) FILTER (WHERE status = 'paid'), 0)::BIGINT
                       AS commission_paid
            FROM affiliate_earnings
            GROUP BY promo_code_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to aggregate earnings: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                Ok(PartnerTotals {
                    promo_code_id: PromoCodeId::from_uuid(
                        row.try_get("promo_code_id")
                            .map_err(|e| DomainError::database(e.to_string()))?,
                    ),
                    conversions: row
                        .try_get::<i64, _>("conversions")
                        .map_err(|e| DomainError::database(e.to_string()))?
                        as u32,
                    revenue: row
                        .try_get("revenue")
                        .map_err(|e| DomainError::database(e.to_string()))?,
                    commission_pending: row
                        .try_get("commission_pending")
                        .map_err(|e| DomainError::database(e.to_string()))?,
                    commission_paid: row
                        .try_get("commission_paid")
                        .map_err(|e| DomainError::database(e.to_string()))?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> EarningRow {
        EarningRow {
            id: Uuid::new_v4(),
            promo_code_id: Uuid::new_v4(),
            referred_user_id: "user-1".to_string(),
            invoice_id: "in_1".to_string(),
            payment_reference: Some("pi_1".to_string()),
            amount_paid: 499,
            commission_rate: 0.05,
            commission_amount: 25,
            tier: "premium".to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
            paid_at: None,
            payout_method: None,
            payout_reference: None,
            payout_notes: None,
        }
    }

    #[test]
    fn row_converts_to_earning() {
        let earning = AffiliateEarning::try_from(row("pending")).unwrap();
        assert_eq!(earning.amount_paid, 499);
        assert_eq!(earning.commission_amount, 25);
        assert_eq!(earning.status, EarningStatus::Pending);
        assert_eq!(earning.tier, SubscriptionTier::Premium);
    }

    #[test]
    fn row_conversion_rejects_unknown_status() {
        assert!(AffiliateEarning::try_from(row("refunded")).is_err());
    }

    #[test]
    fn row_conversion_rejects_unknown_tier() {
        let mut r = row("pending");
        r.tier = "gold".to_string();
        assert!(AffiliateEarning::try_from(r).is_err());
    }
}
