use crate::config::db::{MongoConfig, RedisConfig};
use ::redis::Client as RedisClient;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client as MongoClient, Database, IndexModel};

#[derive(Debug, Clone)]
pub struct InfraClients {
    pub mongo_db: Database,
    pub redis: RedisClient,
}

pub const LC_CHECKS_COLLECTION: &str = "lc_checks";
pub const LC_CASES_COLLECTION: &str = "lc_cases";
pub const AUDIT_EVENTS_COLLECTION: &str = "audit_events";
pub const LOOKUPS_COLLECTION: &str = "lookups";

pub const IDEMPOTENCY_PREFIX: &str = "idem:lccheck:";

pub async fn init_infra(mongo: &MongoConfig, redis: &RedisConfig) -> Result<InfraClients, String> {
    let mongo_client = MongoClient::with_uri_str(&mongo.url)
        .await
        .map_err(|e| format!("mongodb client init failed: {e}"))?;
    let mongo_db = mongo_client.database(&mongo.database);

    ensure_indexes(&mongo_db).await?;

    let redis_client =
        RedisClient::open(redis.url.clone()).map_err(|e| format!("redis client init failed: {e}"))?;

    Ok(InfraClients {
        mongo_db,
        redis: redis_client,
    })
}

/// Uniqueness the engine's correctness leans on. The audit-chain index is
/// the fork guard: two writers that both read the same tail cannot both
/// insert an event carrying that tail's hash as `previousHash`.
async fn ensure_indexes(db: &Database) -> Result<(), String> {
    let unique = |keys: mongodb::bson::Document| {
        IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build()
    };

    db.collection::<mongodb::bson::Document>(AUDIT_EVENTS_COLLECTION)
        .create_index(unique(doc! { "lookupId": 1, "previousHash": 1 }))
        .await
        .map_err(|e| format!("audit chain index failed: {e}"))?;
    db.collection::<mongodb::bson::Document>(LC_CASES_COLLECTION)
        .create_index(unique(doc! { "sourceLookupId": 1 }))
        .await
        .map_err(|e| format!("case index failed: {e}"))?;
    db.collection::<mongodb::bson::Document>(LC_CHECKS_COLLECTION)
        .create_index(unique(doc! { "checkId": 1 }))
        .await
        .map_err(|e| format!("check index failed: {e}"))?;
    db.collection::<mongodb::bson::Document>(LOOKUPS_COLLECTION)
        .create_index(unique(doc! { "publicRef": 1 }))
        .await
        .map_err(|e| format!("lookup index failed: {e}"))?;
    Ok(())
}
