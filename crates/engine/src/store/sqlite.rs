use sea_orm::{
    ActiveValue, ConnectionTrait, Database, DatabaseConnection, TransactionTrait, prelude::*,
    sea_query::OnConflict,
};

use crate::{ResultEngine, blobs};

use super::{BlobKey, BlobStore};

/// Store backed by the `blobs` table through `sea-orm`.
///
/// The table is created by the `migration` crate. `set_many` runs inside a
/// single database transaction, so accounts and transactions are always
/// flushed together.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    database: DatabaseConnection,
}

impl SqliteStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    /// Connects to `url` (e.g. `sqlite:./mvault.db?mode=rwc`).
    pub async fn connect(url: &str) -> ResultEngine<Self> {
        let database = Database::connect(url).await?;
        Ok(Self::new(database))
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

async fn upsert<C>(db: &C, key: BlobKey, payload: String) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let model = blobs::ActiveModel {
        name: ActiveValue::Set(key.as_str().to_string()),
        payload: ActiveValue::Set(payload),
    };
    blobs::Entity::insert(model)
        .on_conflict(
            OnConflict::column(blobs::Column::Name)
                .update_column(blobs::Column::Payload)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

impl BlobStore for SqliteStore {
    async fn get(&self, key: BlobKey) -> ResultEngine<Option<String>> {
        let model = blobs::Entity::find_by_id(key.as_str().to_string())
            .one(&self.database)
            .await?;
        Ok(model.map(|m| m.payload))
    }

    async fn set(&self, key: BlobKey, value: String) -> ResultEngine<()> {
        upsert(&self.database, key, value).await
    }

    async fn set_many(&self, entries: Vec<(BlobKey, String)>) -> ResultEngine<()> {
        let db_tx = self.database.begin().await?;
        for (key, value) in entries {
            upsert(&db_tx, key, value).await?;
        }
        db_tx.commit().await?;
        Ok(())
    }

    async fn clear(&self) -> ResultEngine<()> {
        blobs::Entity::delete_many().exec(&self.database).await?;
        Ok(())
    }
}
