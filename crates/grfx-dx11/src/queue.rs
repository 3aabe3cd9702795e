//! Submission of command lists to an immediate context.

use thiserror::Error;
use tracing::{debug, trace};

use crate::bound_state::DeviceContextState;
use crate::command_list::CommandList;
use crate::context::{DeviceContext, DeviceError};
use crate::execute::{ExecuteConfig, ExecuteMetrics};
use crate::types::{QueryId, QueryKind};

/// Frames a timestamp-disjoint query is left in flight before it is read back.
pub const DEFAULT_QUERY_FRAME_DELAY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    pub query_frame_delay: u32,
    pub execute: ExecuteConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            query_frame_delay: DEFAULT_QUERY_FRAME_DELAY,
            execute: ExecuteConfig::default(),
        }
    }
}

impl QueueConfig {
    pub fn from_env() -> Self {
        Self {
            execute: ExecuteConfig::from_env(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("query frame delay must be at least 1")]
    InvalidFrameDelay,
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Owns an immediate context together with the bound-resource table that mirrors it.
///
/// Every submission brackets its command lists with a timestamp-disjoint query. Queries are kept
/// in a ring of `query_frame_delay + 1` entries and read back `query_frame_delay` frames later.
pub struct Queue<C> {
    context: C,
    bound: DeviceContextState,
    config: QueueConfig,
    disjoint_queries: Vec<QueryId>,
    frames_written: u64,
    frames_read: u64,
    timestamp_frequency: u64,
}

impl<C: DeviceContext> Queue<C> {
    pub fn new(mut context: C, config: QueueConfig) -> Result<Self, QueueError> {
        if config.query_frame_delay == 0 {
            return Err(QueueError::InvalidFrameDelay);
        }

        let disjoint_queries = (0..=config.query_frame_delay)
            .map(|_| context.create_query(QueryKind::TimestampDisjoint))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            context,
            bound: DeviceContextState::new(),
            config,
            disjoint_queries,
            frames_written: 0,
            frames_read: 0,
            timestamp_frequency: 0,
        })
    }

    /// Executes `lists` in order and returns their combined metrics.
    pub fn submit(&mut self, lists: &[&CommandList]) -> ExecuteMetrics {
        let delay = u64::from(self.config.query_frame_delay);
        if self.frames_written > delay {
            self.frames_read += 1;
        }

        let query = self.ring_query(self.frames_written);
        self.context.begin_query(query);
        let mut metrics = ExecuteMetrics::default();
        for list in lists {
            let list_metrics = list.execute(&mut self.context, &mut self.bound, &self.config.execute);
            metrics.accumulate(&list_metrics);
        }
        self.context.end_query(query);
        self.frames_written += 1;

        self.update_timestamp_frequency(delay);
        debug!(
            frame = self.frames_written,
            lists = lists.len(),
            actions = metrics.actions,
            "submitted"
        );
        metrics
    }

    fn ring_query(&self, frame: u64) -> QueryId {
        self.disjoint_queries[(frame % self.disjoint_queries.len() as u64) as usize]
    }

    fn update_timestamp_frequency(&mut self, delay: u64) {
        if self.frames_written <= delay {
            self.timestamp_frequency = 0;
            return;
        }

        let query = self.ring_query(self.frames_read);
        match self.context.timestamp_disjoint(query) {
            Some(data) => self.timestamp_frequency = data.frequency,
            None => trace!(query = query.0, "timestamp disjoint data not ready"),
        }
    }

    /// Ticks per second of the GPU timestamp counter, or 0 until enough frames have completed.
    pub fn timestamp_frequency(&self) -> u64 {
        self.timestamp_frequency
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn bound_state(&self) -> &DeviceContextState {
        &self.bound
    }

    pub fn into_inner(self) -> C {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{DeviceCall, TraceContext};

    #[test]
    fn zero_delay_is_rejected() {
        let config = QueueConfig {
            query_frame_delay: 0,
            ..QueueConfig::default()
        };
        assert!(matches!(
            Queue::new(TraceContext::new(), config),
            Err(QueueError::InvalidFrameDelay)
        ));
    }

    #[test]
    fn creates_delay_plus_one_queries() {
        let queue = Queue::new(TraceContext::new(), QueueConfig::default()).unwrap();
        let created = queue
            .context()
            .count_calls(|c| matches!(c, DeviceCall::CreateQuery { kind: QueryKind::TimestampDisjoint, .. }));
        assert_eq!(created, 4);
    }

    #[test]
    fn frequency_appears_after_delay_frames() {
        let mut ctx = TraceContext::new();
        ctx.set_timestamp_frequency(25_000_000);
        let mut queue = Queue::new(ctx, QueueConfig::default()).unwrap();
        let list = CommandList::new();

        for _ in 0..3 {
            queue.submit(&[&list]);
            assert_eq!(queue.timestamp_frequency(), 0);
        }
        queue.submit(&[&list]);
        assert_eq!(queue.timestamp_frequency(), 25_000_000);
    }
}
