pub mod db;
pub mod handlers;
pub mod service;
pub mod models;
pub mod dto;
pub mod errors;

use std::env;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use db::{init_db_pool, PgStore, Store};
use dotenv::dotenv;
use service::dispatch::AppState;
use service::forms::SessionStore;
use sqlx::{postgres::Postgres, Pool};

type PGPool = Pool<Postgres>;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    service::log::init_logger();
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|e| {
        panic!("Failed to get env with name 'DATABASE_URL': {:?}", e);
    });
    let pool: PGPool = init_db_pool(&db_url).await.unwrap_or_else(|e| {
        panic!("Failed to prepare the database: {:?}", e);
    });
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    let admin_ids = parse_id_list(&env::var("ADMIN_IDS").unwrap_or_default());
    let dean_ids = parse_id_list(&env::var("DEAN_IDS").unwrap_or_default());
    service::admin::seed_roles(store.as_ref(), &admin_ids, &dean_ids).await;

    let state = web::Data::new(AppState {
        store,
        sessions: SessionStore::default(),
    });
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(service::log::LoggerMiddleware)
            .configure(handlers::update::init_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}

fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}
