use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{
        CheckoutStatus,
        NewCheckout,
        OrderId,
        PaymentRecord,
        PaymentStatus,
        PendingCheckout,
        ReconciliationGapRecord,
    },
    traits::{NewPaymentRecord, NewReconciliationGap, PaymentGatewayError},
};

pub async fn insert_checkout(
    checkout: NewCheckout,
    conn: &mut SqliteConnection,
) -> Result<PendingCheckout, PaymentGatewayError> {
    let items_json =
        serde_json::to_string(&checkout.items).map_err(|e| PaymentGatewayError::MalformedCheckout(e.to_string()))?;
    let pending: PendingCheckout = sqlx::query_as(
        r#"
            INSERT INTO pending_checkouts (checkout_id, customer_id, items_json, claimed_total)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(checkout.checkout_id)
    .bind(checkout.customer_id)
    .bind(items_json)
    .bind(checkout.claimed_total)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Checkout [{}] stashed with id {}", pending.checkout_id, pending.id);
    Ok(pending)
}

pub async fn fetch_checkout(
    checkout_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PendingCheckout>, sqlx::Error> {
    let pending = sqlx::query_as("SELECT * FROM pending_checkouts WHERE checkout_id = $1")
        .bind(checkout_id)
        .fetch_optional(conn)
        .await?;
    Ok(pending)
}

/// Claims the checkout for confirmation. The status predicate makes the transition
/// `Initiated -> Confirming` single-shot: the statement updates at most one row, exactly once
/// across all concurrent or repeated invocations.
pub async fn claim_checkout(
    checkout_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PendingCheckout>, sqlx::Error> {
    let claimed = sqlx::query_as(
        r#"
            UPDATE pending_checkouts SET status = 'Confirming', updated_at = CURRENT_TIMESTAMP
            WHERE checkout_id = $1 AND status = 'Initiated'
            RETURNING *;
        "#,
    )
    .bind(checkout_id)
    .fetch_optional(conn)
    .await?;
    Ok(claimed)
}

pub async fn set_checkout_status(
    checkout_id: &str,
    status: CheckoutStatus,
    conn: &mut SqliteConnection,
) -> Result<(), PaymentGatewayError> {
    let result = sqlx::query(
        "UPDATE pending_checkouts SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE checkout_id = $2",
    )
    .bind(status.to_string())
    .bind(checkout_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PaymentGatewayError::CheckoutNotFound(checkout_id.to_string()));
    }
    Ok(())
}

/// Inserts the payment record, returning `false` in the second parameter if a record with this
/// payment key already exists.
pub async fn idempotent_insert_payment(
    payment: NewPaymentRecord,
    conn: &mut SqliteConnection,
) -> Result<(PaymentRecord, bool), PaymentGatewayError> {
    let inserted = match fetch_payment_by_key(&payment.payment_key, &mut *conn).await? {
        Some(record) => (record, false),
        None => {
            let record: PaymentRecord = sqlx::query_as(
                r#"
                    INSERT INTO payments (payment_key, checkout_id, amount)
                    VALUES ($1, $2, $3)
                    RETURNING *;
                "#,
            )
            .bind(payment.payment_key)
            .bind(payment.checkout_id)
            .bind(payment.amount)
            .fetch_one(conn)
            .await?;
            debug!("📝️ Payment [{}] recorded with id {}", record.payment_key, record.id);
            (record, true)
        },
    };
    Ok(inserted)
}

pub async fn fetch_payment_by_key(
    payment_key: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentRecord>, sqlx::Error> {
    let record =
        sqlx::query_as("SELECT * FROM payments WHERE payment_key = $1").bind(payment_key).fetch_optional(conn).await?;
    Ok(record)
}

pub(crate) async fn update_payment_status(
    payment_key: &str,
    status: PaymentStatus,
    approved_at: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<PaymentRecord, PaymentGatewayError> {
    let result: Option<PaymentRecord> = sqlx::query_as(
        r#"
            UPDATE payments SET status = $1, approved_at = $2, updated_at = CURRENT_TIMESTAMP
            WHERE payment_key = $3
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(approved_at)
    .bind(payment_key)
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| PaymentGatewayError::PaymentNotFound(payment_key.to_string()))
}

pub(crate) async fn link_payment_to_order(
    payment_key: &str,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<(), PaymentGatewayError> {
    let result = sqlx::query(
        "UPDATE payments SET order_id = $1, updated_at = CURRENT_TIMESTAMP WHERE payment_key = $2",
    )
    .bind(order_id.as_str())
    .bind(payment_key)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PaymentGatewayError::PaymentNotFound(payment_key.to_string()));
    }
    Ok(())
}

pub async fn insert_gap(
    gap: NewReconciliationGap,
    conn: &mut SqliteConnection,
) -> Result<ReconciliationGapRecord, PaymentGatewayError> {
    let record: ReconciliationGapRecord = sqlx::query_as(
        r#"
            INSERT INTO reconciliation_gaps (checkout_id, payment_key, amount, reason, detail)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(gap.checkout_id)
    .bind(gap.payment_key)
    .bind(gap.amount)
    .bind(gap.reason.to_string())
    .bind(gap.detail)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn unresolved_gaps(conn: &mut SqliteConnection) -> Result<Vec<ReconciliationGapRecord>, sqlx::Error> {
    let gaps = sqlx::query_as("SELECT * FROM reconciliation_gaps WHERE resolved = 0 ORDER BY created_at DESC, id DESC")
        .fetch_all(conn)
        .await?;
    Ok(gaps)
}
