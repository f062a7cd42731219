use sqlx::MySqlPool;
use tracing::info;

use crate::error::AppResult;

pub async fn init_db(database_url: &str) -> AppResult<MySqlPool> {
    let pool = MySqlPool::connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database connected and migrations applied");
    Ok(pool)
}
