#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use evparts_api::config::AppConfig;
use evparts_api::db;
use evparts_api::entities::case_line::{self, CaseLineStatus};
use evparts_api::entities::component_unit::{self, ComponentStatus};
use evparts_api::entities::{stock_record, stock_reservation, stock_transfer_request, warehouse};
use evparts_api::events::{process_events, EventSender};
use evparts_api::notifications::{Notifier, TracingNotifier};
use evparts_api::services::AppServices;
use evparts_api::{api_v1_routes, AppState};

/// Test harness over a fresh SQLite database with migrations applied.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub event_sender: EventSender,
    pub company_id: Uuid,
    database_url: String,
    _event_task: tokio::task::JoinHandle<()>,
    db_file: std::path::PathBuf,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_pool_size(10).await
    }

    /// A pool of exactly one connection. Concurrent tasks still interleave at
    /// the tokio level but their transactions serialize on connection
    /// acquisition, which SQLite needs to host write races without
    /// `SQLITE_BUSY`.
    pub async fn with_single_connection() -> Self {
        Self::with_pool_size(1).await
    }

    async fn with_pool_size(max_connections: u32) -> Self {
        let db_file =
            std::env::temp_dir().join(format!("evparts_test_{}.db", Uuid::new_v4().simple()));
        let database_url = format!("sqlite://{}?mode=rwc", db_file.display());

        let mut options = ConnectOptions::new(database_url.clone());
        options
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);
        let pool = Database::connect(options).await.expect("db connect");
        db::run_migrations(&pool).await.expect("migrations");
        let db = Arc::new(pool);

        let (tx, rx) = mpsc::channel(100);
        let event_sender = EventSender::new(tx);
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
        let event_task = tokio::spawn(process_events(rx, notifier));

        let services = AppServices::new(db.clone(), event_sender.clone());

        Self {
            db,
            services,
            event_sender,
            company_id: Uuid::new_v4(),
            database_url,
            _event_task: event_task,
            db_file,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            db: self.db.clone(),
            config: AppConfig {
                database_url: self.database_url.clone(),
                host: "127.0.0.1".to_string(),
                port: 18080,
                environment: "test".to_string(),
                log_level: "info".to_string(),
                log_json: false,
                auto_migrate: true,
                cors_allowed_origins: None,
                event_channel_capacity: 100,
            },
            event_sender: self.event_sender.clone(),
            services: self.services.clone(),
        }
    }

    /// The v1 API router, ready for `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        Router::new()
            .nest("/api/v1", api_v1_routes())
            .with_state(self.state())
    }

    pub async fn create_warehouse(&self, service_center_id: Option<Uuid>, priority: i32) -> Uuid {
        let model = warehouse::ActiveModel {
            company_id: Set(self.company_id),
            service_center_id: Set(service_center_id),
            name: Set(format!("warehouse-{}", priority)),
            priority: Set(priority),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert warehouse");
        model.id
    }

    pub async fn create_warehouse_for_company(&self, company_id: Uuid, priority: i32) -> Uuid {
        let model = warehouse::ActiveModel {
            company_id: Set(company_id),
            service_center_id: Set(None),
            name: Set(format!("other-{}", priority)),
            priority: Set(priority),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert warehouse");
        model.id
    }

    pub async fn create_stock(
        &self,
        warehouse_id: Uuid,
        type_component_id: Uuid,
        quantity_in_stock: i32,
    ) -> Uuid {
        let model = stock_record::ActiveModel {
            warehouse_id: Set(warehouse_id),
            type_component_id: Set(type_component_id),
            quantity_in_stock: Set(quantity_in_stock),
            quantity_reserved: Set(0),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert stock record");
        model.id
    }

    /// Seeds `count` serial-tracked units sitting IN_WAREHOUSE.
    pub async fn create_units(
        &self,
        warehouse_id: Uuid,
        type_component_id: Uuid,
        count: usize,
    ) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let model = component_unit::ActiveModel {
                serial_number: Set(format!("SN-{}", Uuid::new_v4().simple())),
                type_component_id: Set(type_component_id),
                status: Set(ComponentStatus::InWarehouse.as_str().to_string()),
                warehouse_id: Set(Some(warehouse_id)),
                ..Default::default()
            }
            .insert(self.db.as_ref())
            .await
            .expect("insert component unit");
            ids.push(model.id);
        }
        ids
    }

    pub async fn create_case_line(&self) -> Uuid {
        let model = case_line::ActiveModel {
            status: Set(CaseLineStatus::Diagnosed.as_str().to_string()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert case line");
        model.id
    }

    pub async fn stock(&self, stock_id: Uuid) -> stock_record::Model {
        stock_record::Entity::find_by_id(stock_id)
            .one(self.db.as_ref())
            .await
            .expect("query stock")
            .expect("stock record exists")
    }

    pub async fn stock_at(
        &self,
        warehouse_id: Uuid,
        type_component_id: Uuid,
    ) -> Option<stock_record::Model> {
        use sea_orm::{ColumnTrait, QueryFilter};
        stock_record::Entity::find()
            .filter(stock_record::Column::WarehouseId.eq(warehouse_id))
            .filter(stock_record::Column::TypeComponentId.eq(type_component_id))
            .one(self.db.as_ref())
            .await
            .expect("query stock")
    }

    pub async fn request(&self, request_id: Uuid) -> stock_transfer_request::Model {
        stock_transfer_request::Entity::find_by_id(request_id)
            .one(self.db.as_ref())
            .await
            .expect("query request")
            .expect("request exists")
    }

    pub async fn reservation(&self, reservation_id: Uuid) -> stock_reservation::Model {
        stock_reservation::Entity::find_by_id(reservation_id)
            .one(self.db.as_ref())
            .await
            .expect("query reservation")
            .expect("reservation exists")
    }

    pub async fn case_line(&self, case_line_id: Uuid) -> case_line::Model {
        case_line::Entity::find_by_id(case_line_id)
            .one(self.db.as_ref())
            .await
            .expect("query case line")
            .expect("case line exists")
    }

    pub async fn unit(&self, unit_id: Uuid) -> component_unit::Model {
        component_unit::Entity::find_by_id(unit_id)
            .one(self.db.as_ref())
            .await
            .expect("query unit")
            .expect("unit exists")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_file);
    }
}
