//! Per-session daily generation quota backed by Redis.
//!
//! Check and increment are one atomic INCR: the returned count IS the
//! decision, so two concurrent requests from the same session can never
//! both sneak under the cap. The key expires at the end of its UTC day.

use chrono::Utc;
use redis::AsyncCommands;
use tracing::debug;

const DAY_SECONDS: i64 = 86_400;

/// The outcome of one quota check.
#[derive(Debug, Clone, Copy)]
pub enum QuotaDecision {
    Allowed { remaining: u32 },
    Exceeded { retry_after_seconds: i64 },
}

/// Daily quota counter. Cheap to clone; the underlying client pools
/// connections lazily.
#[derive(Clone)]
pub struct DailyQuota {
    client: redis::Client,
    limit: u32,
}

impl DailyQuota {
    pub fn new(client: redis::Client, limit: u32) -> Self {
        Self { client, limit }
    }

    /// Atomically consumes one unit of today's quota for the session.
    pub async fn check_and_increment(
        &self,
        session_id: &str,
    ) -> Result<QuotaDecision, redis::RedisError> {
        let key = format!(
            "quota:generation:{}:{}",
            session_id,
            Utc::now().format("%Y%m%d")
        );

        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let count: u32 = conn.incr(&key, 1u32).await?;
        if count == 1 {
            conn.expire::<_, ()>(&key, DAY_SECONDS).await?;
        }

        if count > self.limit {
            let ttl: i64 = conn.ttl(&key).await?;
            debug!("quota exceeded for session {session_id}: {count}/{}", self.limit);
            return Ok(QuotaDecision::Exceeded {
                retry_after_seconds: ttl.max(0),
            });
        }

        Ok(QuotaDecision::Allowed {
            remaining: self.limit - count,
        })
    }
}
