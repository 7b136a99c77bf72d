//! Initial MongoDB handshake. The storage supervisor handles long-term
//! reconnection; this only has to get the first connection up.

use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;

use super::error::{MongoDaoError, MongoResult};

const PING_ATTEMPTS: u32 = 10;
const FIRST_RETRY: Duration = Duration::from_millis(250);
const RETRY_CAP: Duration = Duration::from_secs(5);

/// Build a client from the parsed options and ping until the server answers,
/// doubling the wait between attempts.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<Database> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut delay = FIRST_RETRY;
    for _ in 1..PING_ATTEMPTS {
        if database.run_command(doc! { "ping": 1 }).await.is_ok() {
            return Ok(database);
        }
        sleep(delay).await;
        delay = (delay * 2).min(RETRY_CAP);
    }

    // Last attempt carries the error out.
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|source| MongoDaoError::InitialPing {
            attempts: PING_ATTEMPTS,
            source,
        })?;

    Ok(database)
}
