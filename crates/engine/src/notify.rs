//! Notification fan-out for pool state changes.
//!
//! Fan-out runs after the state mutation has committed and holds no lock
//! on the pool. Delivery is best-effort per recipient: one failed send is
//! logged and never blocks the remaining recipients or unwinds the
//! transition that produced the notice.

use copool_data::{Notice, NotificationSink};
use copool_domain::lifecycle;
use copool_domain::{Pool, PoolState};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fans one state-change notice out to every participant of a pool.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Emits one notice per participant for the entered state.
    ///
    /// States without a mapped content string (only `Open`) fan out
    /// nothing. Returns how many notices were delivered.
    pub async fn pool_state_changed(&self, pool: &Pool, state: PoolState) -> usize {
        let Some(content) = lifecycle::notice_for(state) else {
            return 0;
        };

        let mut delivered = 0;
        for participant in &pool.participants {
            let notice = Notice {
                recipient: participant.user_id,
                origin: "pool".to_string(),
                pool_id: pool.id,
                offer_image: pool.offer.image.clone(),
                pool_kind: pool.kind,
                pool_label: pool.label.clone(),
                content: content.to_string(),
            };
            match self.sink.send(&notice).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        recipient = %participant.user_id,
                        pool = %pool.id,
                        error = %e,
                        "Notice delivery failed"
                    );
                }
            }
        }

        debug!(
            pool = %pool.id,
            state = state.code(),
            delivered,
            participants = pool.participants.len(),
            "Fanned out state-change notices"
        );
        delivered
    }
}
