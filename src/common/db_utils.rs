// src/common/db_utils.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

// SQLSTATE de violação de EXCLUDE (bookings_no_double_booking)
const EXCLUSION_VIOLATION: &str = "23P01";

// ---
// Helper de concorrência: a "fila" por loja
// ---
/// Advisory lock da transação, chaveado pelo id da loja.
/// Serializa criar/remarcar reservas da mesma loja; é liberado sozinho no
/// commit ou rollback, então nunca fica preso entre requisições.
pub(crate) async fn lock_shop<'e, E>(executor: E, shop_id: Uuid) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(shop_id.to_string())
        .execute(executor)
        .await?;
    Ok(())
}

/// Erros de escrita no ledger: a constraint EXCLUDE é a última barreira
/// contra reserva dupla e vira `Conflict` para o cliente tentar outro horário.
pub(crate) fn map_booking_write_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
            return AppError::Conflict("cadeira já reservada neste horário".into());
        }
    }
    AppError::DatabaseError(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_stay_database_errors() {
        let mapped = map_booking_write_error(sqlx::Error::RowNotFound);
        assert!(matches!(mapped, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
