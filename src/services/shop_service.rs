// src/services/shop_service.rs

use std::sync::Arc;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::Storage,
    models::{
        auth::{RequestContext, Role},
        shop::{NewService, NewShop, Service, Shop},
    },
};

// Offset máximo aceito (UTC±14h)
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Só o dono da loja mexe em agenda e catálogo.
pub fn ensure_owner(ctx: &RequestContext, shop: &Shop) -> Result<(), AppError> {
    if ctx.role == Role::ShopOwner && shop.owner_id == ctx.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[derive(Debug, Clone)]
pub struct CreateShopRequest {
    pub name: String,
    pub address: Option<String>,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub seat_count: i32,
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone)]
pub struct CreateServiceRequest {
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: i32,
    pub is_predefined: bool,
}

#[derive(Clone)]
pub struct ShopService {
    storage: Arc<dyn Storage>,
}

impl ShopService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    // --- LOJAS ---

    pub async fn create_shop(
        &self,
        ctx: &RequestContext,
        req: CreateShopRequest,
    ) -> Result<Shop, AppError> {
        if ctx.role != Role::ShopOwner {
            return Err(AppError::Forbidden);
        }
        if req.open_time >= req.close_time {
            return Err(AppError::InvalidInput(
                "o horário de abertura deve ser antes do fechamento".into(),
            ));
        }
        if req.seat_count < 0 {
            return Err(AppError::InvalidInput("o número de cadeiras não pode ser negativo".into()));
        }
        if req.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(AppError::InvalidInput("fuso horário fora do intervalo UTC±14h".into()));
        }

        let shop = self
            .storage
            .create_shop(NewShop {
                owner_id: ctx.user_id,
                name: req.name.trim().to_string(),
                address: req.address,
                open_time: req.open_time,
                close_time: req.close_time,
                seat_count: req.seat_count,
                utc_offset_minutes: req.utc_offset_minutes,
            })
            .await?;

        tracing::info!("💈 Loja {} criada por {}", shop.id, ctx.user_id);
        Ok(shop)
    }

    pub async fn get_shop(&self, shop_id: Uuid) -> Result<Shop, AppError> {
        self.storage
            .get_shop(shop_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Loja {}", shop_id)))
    }

    pub async fn list_shops(&self) -> Result<Vec<Shop>, AppError> {
        self.storage.list_shops().await
    }

    // --- SERVIÇOS ---

    pub async fn create_service(
        &self,
        ctx: &RequestContext,
        shop_id: Uuid,
        req: CreateServiceRequest,
    ) -> Result<Service, AppError> {
        let shop = self.get_shop(shop_id).await?;
        ensure_owner(ctx, &shop)?;

        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("o nome do serviço é obrigatório".into()));
        }
        if req.price < Decimal::ZERO {
            return Err(AppError::InvalidInput("o preço não pode ser negativo".into()));
        }
        if req.duration_minutes <= 0 {
            return Err(AppError::InvalidInput("a duração deve ser maior que zero".into()));
        }

        self.storage
            .create_service(NewService {
                shop_id,
                name,
                price: req.price,
                duration_minutes: req.duration_minutes,
                is_predefined: req.is_predefined,
            })
            .await
    }

    pub async fn list_services(&self, shop_id: Uuid) -> Result<Vec<Service>, AppError> {
        // 404 para loja inexistente, em vez de lista vazia
        self.get_shop(shop_id).await?;
        self.storage.list_services(shop_id).await
    }

    pub async fn delete_service(
        &self,
        ctx: &RequestContext,
        shop_id: Uuid,
        service_id: Uuid,
    ) -> Result<(), AppError> {
        let shop = self.get_shop(shop_id).await?;
        ensure_owner(ctx, &shop)?;

        if !self.storage.delete_service(shop_id, service_id).await? {
            return Err(AppError::ResourceNotFound(format!("Serviço {}", service_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStorage;

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn owner() -> RequestContext {
        RequestContext { user_id: Uuid::new_v4(), role: Role::ShopOwner }
    }

    fn shop_req() -> CreateShopRequest {
        CreateShopRequest {
            name: "  Salão Central ".into(),
            address: None,
            open_time: t(10),
            close_time: t(20),
            seat_count: 2,
            utc_offset_minutes: -180,
        }
    }

    fn service_req(name: &str) -> CreateServiceRequest {
        CreateServiceRequest {
            name: name.into(),
            price: Decimal::new(4500, 2),
            duration_minutes: 30,
            is_predefined: false,
        }
    }

    #[tokio::test]
    async fn customers_cannot_create_shops() {
        let service = ShopService::new(Arc::new(InMemoryStorage::new()));
        let customer = RequestContext { user_id: Uuid::new_v4(), role: Role::Customer };
        assert!(matches!(
            service.create_shop(&customer, shop_req()).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn shop_hours_must_be_ordered() {
        let service = ShopService::new(Arc::new(InMemoryStorage::new()));
        let mut req = shop_req();
        req.close_time = t(9);
        assert!(matches!(
            service.create_shop(&owner(), req).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn service_names_are_unique_ignoring_case() {
        let service = ShopService::new(Arc::new(InMemoryStorage::new()));
        let ctx = owner();
        let shop = service.create_shop(&ctx, shop_req()).await.unwrap();
        assert_eq!(shop.name, "Salão Central");

        service.create_service(&ctx, shop.id, service_req("Corte")).await.unwrap();
        let dup = service.create_service(&ctx, shop.id, service_req("CORTE")).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
        assert_eq!(service.list_services(shop.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_the_owner_edits_the_catalogue() {
        let service = ShopService::new(Arc::new(InMemoryStorage::new()));
        let ctx = owner();
        let shop = service.create_shop(&ctx, shop_req()).await.unwrap();

        let stranger = owner();
        assert!(matches!(
            service.create_service(&stranger, shop.id, service_req("Escova")).await,
            Err(AppError::Forbidden)
        ));

        let created = service.create_service(&ctx, shop.id, service_req("Escova")).await.unwrap();
        assert!(matches!(
            service.delete_service(&stranger, shop.id, created.id).await,
            Err(AppError::Forbidden)
        ));
        service.delete_service(&ctx, shop.id, created.id).await.unwrap();
        assert!(matches!(
            service.delete_service(&ctx, shop.id, created.id).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_shop_is_not_found() {
        let service = ShopService::new(Arc::new(InMemoryStorage::new()));
        assert!(matches!(
            service.get_shop(Uuid::new_v4()).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }
}
