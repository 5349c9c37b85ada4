use std::{sync::Arc, time::Duration};

use redis::aio::ConnectionManager;

use super::{config::Config, database::init_redis, fault::FaultInjector};

pub struct State {
    pub config: Config,
    pub hostname: String,
    pub redis_connection: ConnectionManager,
    pub fault: FaultInjector,
}

impl State {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let hostname = gethostname::gethostname().to_string_lossy().into_owned();

        let redis_connection = init_redis(&config.redis_url).await;

        let fault = FaultInjector::new(
            config.error_sim_enabled,
            config.error_sim_rate,
            Duration::from_secs(config.error_sim_auto_disable_seconds),
        );

        Arc::new(Self {
            config,
            hostname,
            redis_connection,
            fault,
        })
    }
}
