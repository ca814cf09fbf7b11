use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::core::servo::ServoMap;
use crate::domain::model::{AngleBroadcast, TargetMessage};
use crate::domain::ports::{ActuatorLink, AnglePredictor};

const BROADCAST_CAPACITY: usize = 64;

/// Process-lifetime counters, shared with the control endpoint.
#[derive(Debug, Default)]
pub struct RelayStats {
    pub connected: AtomicUsize,
    pub received: AtomicU64,
    pub broadcasts: AtomicU64,
    pub dropped: AtomicU64,
    pub actuator_failures: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub listeners: usize,
    pub received: u64,
    pub broadcasts: u64,
    pub dropped: u64,
    pub actuator_failures: u64,
}

impl RelayStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            listeners: self.connected.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            actuator_failures: self.actuator_failures.load(Ordering::Relaxed),
        }
    }
}

/// Per-message relay pipeline: parse → predict → broadcast → actuate.
pub struct RelayService<P: AnglePredictor, A: ActuatorLink> {
    predictor: P,
    actuator: A,
    servo_map: ServoMap,
    broadcast_tx: broadcast::Sender<AngleBroadcast>,
    stats: Arc<RelayStats>,
}

impl<P: AnglePredictor, A: ActuatorLink> RelayService<P, A> {
    pub fn new(predictor: P, actuator: A, servo_map: ServoMap) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            predictor,
            actuator,
            servo_map,
            broadcast_tx,
            stats: Arc::new(RelayStats::default()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AngleBroadcast> {
        self.broadcast_tx.subscribe()
    }

    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Relay one inbound text frame.
    ///
    /// Never fails: a bad frame or a failed actuator call is logged and
    /// the next frame proceeds untouched.
    pub async fn process_message(&self, raw: &str) {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let message: TargetMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Discarding unparseable frame: {}", e);
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let position = match message.target_position {
            Some(position) if !position.is_empty() => position,
            _ => {
                tracing::warn!("No target position in frame, skipping");
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        tracing::debug!("Target position received: {:?}", position);

        let angles = match self.predictor.predict(&position) {
            Ok(angles) => angles,
            Err(e) => {
                tracing::warn!("Prediction failed for {:?}: {}", position, e);
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        // 先廣播再驅動,兩個效果各自獨立
        let _ = self.broadcast_tx.send(AngleBroadcast {
            target_position: angles,
        });
        self.stats.broadcasts.fetch_add(1, Ordering::Relaxed);

        let command = self.servo_map.apply(&angles);
        match self.actuator.push_angles(&command).await {
            Ok(()) => tracing::debug!("Sent to actuator: {:?}", command.angles),
            Err(e) => {
                self.stats.actuator_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Actuator delivery failed: {}", e);
            }
        }
    }
}
