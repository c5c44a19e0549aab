// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::{
        clock::{Clock, SystemClock},
        i18n::I18nStore,
    },
    db::{InMemoryStorage, PgStorage, Storage},
    services::{
        auth::AuthService,
        availability_service::{AvailabilityService, MAX_RANGE_DAYS},
        booking_service::BookingService,
        schedule_service::ScheduleService,
        shop_service::ShopService,
    },
};

#[derive(Debug, Clone)]
pub struct Settings {
    // Sem DATABASE_URL o app sobe com armazenamento em memória
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub booking_window_days: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = non_empty("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match non_empty("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: '{}'", raw))?,
            None => 5,
        };

        let booking_window_days = match non_empty("BOOKING_WINDOW_DAYS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("BOOKING_WINDOW_DAYS inválido: '{}'", raw))?,
            None => 7,
        };
        if booking_window_days == 0 || i64::from(booking_window_days) > MAX_RANGE_DAYS {
            anyhow::bail!("BOOKING_WINDOW_DAYS deve estar entre 1 e {}", MAX_RANGE_DAYS);
        }

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            server_addr: non_empty("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            booking_window_days,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub shop_service: ShopService,
    pub schedule_service: ScheduleService,
    pub booking_service: BookingService,
    pub availability_service: AvailabilityService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let storage: Arc<dyn Storage> = match &settings.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(settings.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgStorage::new(db_pool))
            }
            None => {
                tracing::warn!("⚠️ DATABASE_URL ausente: usando armazenamento em memória (os dados somem ao reiniciar)");
                Arc::new(InMemoryStorage::new())
            }
        };

        Ok(Self::with_storage(settings, storage, Arc::new(SystemClock)))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_storage(settings: Settings, storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        let schedule_service = ScheduleService::new(storage.clone());
        let availability_service = AvailabilityService::new(
            storage.clone(),
            clock.clone(),
            schedule_service.clone(),
            settings.booking_window_days,
        );
        let booking_service = BookingService::new(storage.clone(), clock, schedule_service.clone());

        Self {
            auth_service: AuthService::new(storage.clone(), settings.jwt_secret.clone()),
            shop_service: ShopService::new(storage),
            schedule_service,
            booking_service,
            availability_service,
            i18n_store: Arc::new(I18nStore::new()),
            settings: Arc::new(settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let settings = Settings::from_lookup(lookup(&[("JWT_SECRET", "s3cr3t")])).unwrap();
        assert_eq!(settings.database_url, None);
        assert_eq!(settings.server_addr, "0.0.0.0:3000");
        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.booking_window_days, 7);
    }

    #[test]
    fn missing_secret_fails() {
        assert!(Settings::from_lookup(lookup(&[])).is_err());
        assert!(Settings::from_lookup(lookup(&[("JWT_SECRET", "  ")])).is_err());
    }

    #[test]
    fn malformed_numbers_fail() {
        let bad = lookup(&[("JWT_SECRET", "x"), ("DB_MAX_CONNECTIONS", "muitas")]);
        assert!(Settings::from_lookup(bad).is_err());
        let too_wide = lookup(&[("JWT_SECRET", "x"), ("BOOKING_WINDOW_DAYS", "90")]);
        assert!(Settings::from_lookup(too_wide).is_err());
        let zero = lookup(&[("JWT_SECRET", "x"), ("BOOKING_WINDOW_DAYS", "0")]);
        assert!(Settings::from_lookup(zero).is_err());
    }

    #[test]
    fn explicit_values_are_used() {
        let settings = Settings::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("DATABASE_URL", "postgres://localhost/salao"),
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("BOOKING_WINDOW_DAYS", "14"),
        ]))
        .unwrap();
        assert_eq!(settings.database_url.as_deref(), Some("postgres://localhost/salao"));
        assert_eq!(settings.server_addr, "127.0.0.1:8080");
        assert_eq!(settings.booking_window_days, 14);
    }
}
