//! # Redis
//!
//! The vote queue.
//!
//! Votes are not tallied here. Each accepted submission is appended to a
//! single Redis list (`RPUSH votes <json>`) and a separate worker drains it.
//! From this service's point of view the queue is opaque and append-only.
//!
//! ## Requirements
//!
//! - O(1) appends, no reads in the request path
//! - Payloads are small JSON blobs: voter id plus the chosen option
//! - Eventual consistency is fine, the worker owns the tally
use std::time::Duration;

use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use serde::Serialize;

use crate::error::AppError;

pub const VOTES_QUEUE: &str = "votes";

#[derive(Serialize)]
pub struct VotePayload<'a> {
    pub voter_id: &'a str,
    pub vote: &'a str,
}

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .unwrap();

    connection_manager
}

pub async fn push_vote(
    mut connection: ConnectionManager,
    voter_id: &str,
    vote: &str,
) -> Result<(), AppError> {
    let data = serde_json::to_string(&VotePayload { voter_id, vote })
        .map_err(|e| AppError::InternalError(e.into()))?;

    let _: () = connection
        .rpush(VOTES_QUEUE, data)
        .await
        .map_err(|e| AppError::InternalError(e.into()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::VotePayload;

    #[test]
    fn test_payload_shape() {
        let payload = VotePayload {
            voter_id: "a1b2c3d4e5f60718",
            vote: "a",
        };

        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"voter_id":"a1b2c3d4e5f60718","vote":"a"}"#
        );
    }
}
