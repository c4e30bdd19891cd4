use std::sync::Arc;
use crate::{
    config::Config,
    infrastructure::database::{connect_store, ClimateStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClimateStore>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // No connection is opened here; every task opens its own
        let store = connect_store(&config.database).await?;

        Ok(Self { store, config })
    }
}
