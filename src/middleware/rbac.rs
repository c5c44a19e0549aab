// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    models::auth::{RequestContext, Role},
};

/// Papel exigido por uma rota.
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> Role;
}

/// Guardião de papel. Depende do `auth_guard` ter rodado antes.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .ok_or(AppError::InvalidToken)?;

        if ctx.role != T::role() {
            return Err(AppError::Forbidden);
        }
        Ok(RequireRole(PhantomData))
    }
}

pub struct RoleShopOwner;
impl RoleDef for RoleShopOwner {
    fn role() -> Role {
        Role::ShopOwner
    }
}
