use color_eyre::eyre::Result;
use dotenv::dotenv;
use lessonsync_api::config::ApiConfig;
use lessonsync_db::{create_pool, schema::initialize_database};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ApiConfig::from_env()?;

    // Schema setup is idempotent, so the server can run it on every start
    let db_pool = create_pool(&config.database_url).await?;
    initialize_database(&db_pool).await?;

    lessonsync_api::start_server(config, db_pool).await?;

    Ok(())
}
