use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;

use packrat_events::{EventPublisher, PublisherConfig};
use packrat_infra::{
    AppConfig, DataAccess, DataAccessConfig, PostgresRecordStore, RedisCacheStore, RedisEventSink,
};

#[tokio::main]
async fn main() {
    packrat_observability::init();

    let config = AppConfig::from_env().expect("configuration error");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to postgres");

    let redis_client =
        redis::Client::open(config.redis_url.as_str()).expect("invalid redis url");
    let redis_conn = ConnectionManager::new(redis_client)
        .await
        .expect("failed to connect to redis");

    let store = PostgresRecordStore::new(pool, config.write_policy);
    let cache = RedisCacheStore::new(redis_conn.clone());
    let sink = Arc::new(RedisEventSink::new(redis_conn));

    let (publisher, publisher_handle) = EventPublisher::spawn(
        sink,
        PublisherConfig::default()
            .with_topic(config.topic.clone())
            .with_workers(config.publisher_workers)
            .with_queue_capacity(config.publisher_queue_capacity),
    );

    let access = Arc::new(DataAccess::new(
        store,
        cache,
        Arc::new(publisher),
        DataAccessConfig {
            cache_ttl: config.cache_ttl,
            revision: config.revision.clone(),
        },
    ));

    let app = packrat_api::app::build_router(access, config.auth_header.clone());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind listener");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server exited");
    }

    // Let queued events flush before the process exits.
    publisher_handle.shutdown().await;
}
