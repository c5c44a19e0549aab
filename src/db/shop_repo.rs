// src/db/shop_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::shop::{NewService, NewShop, Service, Shop},
};

#[derive(Clone)]
pub struct ShopRepository {
    pool: PgPool,
}

impl ShopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LOJAS
    // =========================================================================

    pub async fn create_shop(&self, shop: NewShop) -> Result<Shop, AppError> {
        let created = sqlx::query_as::<_, Shop>(
            r#"
            INSERT INTO shops (
                owner_id, name, address, open_time, close_time, seat_count, utc_offset_minutes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(shop.owner_id)
        .bind(&shop.name)
        .bind(&shop.address)
        .bind(shop.open_time)
        .bind(shop.close_time)
        .bind(shop.seat_count)
        .bind(shop.utc_offset_minutes)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Shop>, AppError> {
        let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(shop)
    }

    pub async fn list(&self) -> Result<Vec<Shop>, AppError> {
        let shops = sqlx::query_as::<_, Shop>("SELECT * FROM shops ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(shops)
    }

    // =========================================================================
    //  SERVIÇOS
    // =========================================================================

    pub async fn create_service(&self, service: NewService) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (shop_id, name, price, duration_minutes, is_predefined)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(service.shop_id)
        .bind(&service.name)
        .bind(service.price)
        .bind(service.duration_minutes)
        .bind(service.is_predefined)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // índice único (shop_id, LOWER(name))
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("serviço '{}' já existe", service.name));
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn list_services(&self, shop_id: Uuid) -> Result<Vec<Service>, AppError> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE shop_id = $1 ORDER BY name",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    pub async fn delete_service(&self, shop_id: Uuid, service_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1 AND shop_id = $2")
            .bind(service_id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
