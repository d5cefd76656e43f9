//! The single-row `settings` table.

use sqlx::PgPool;

use crate::DbError;

/// The shop's WhatsApp number; empty until an admin sets it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the seeded row is missing, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_whatsapp_number(pool: &PgPool) -> Result<String, DbError> {
    sqlx::query_scalar::<_, String>("SELECT whatsapp_number FROM settings WHERE id = 1")
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Stores the shop's WhatsApp number. Callers validate the value.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn set_whatsapp_number(pool: &PgPool, number: &str) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO settings (id, whatsapp_number) VALUES (1, $1) \
         ON CONFLICT (id) DO UPDATE SET \
             whatsapp_number = EXCLUDED.whatsapp_number, \
             updated_at      = NOW()",
    )
    .bind(number)
    .execute(pool)
    .await?;
    Ok(())
}
