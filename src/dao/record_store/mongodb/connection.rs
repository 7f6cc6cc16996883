use std::{iter, time::Duration};

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::warn;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

const PING_ATTEMPTS: usize = 10;
const FIRST_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Waits between failed pings: doubling from 250ms, capped at 5s, one per retry.
fn ping_backoff() -> impl Iterator<Item = Duration> {
    iter::successors(Some(FIRST_PING_DELAY), |delay| {
        Some((*delay * 2).min(MAX_PING_DELAY))
    })
    .take(PING_ATTEMPTS - 1)
}

/// Open the board database, pinging it until it answers or the backoff runs out.
pub async fn open_database(config: &MongoConfig) -> MongoResult<Database> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut backoff = ping_backoff();
    let mut attempts = 0;
    loop {
        attempts += 1;
        let Err(source) = database.run_command(doc! { "ping": 1 }).await else {
            return Ok(database);
        };
        let Some(delay) = backoff.next() else {
            return Err(MongoDaoError::InitialPing { attempts, source });
        };
        warn!(
            attempts,
            wait_ms = delay.as_millis(),
            error = %source,
            "MongoDB not answering yet"
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let delays: Vec<u64> = ping_backoff().map(|delay| delay.as_millis() as u64).collect();
        assert_eq!(delays, [250, 500, 1000, 2000, 4000, 5000, 5000, 5000, 5000]);
    }
}
