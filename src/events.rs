use crate::models::{BetStatus, PickActionKind};
use tokio::sync::mpsc::UnboundedSender;

/// Fire-and-forget notifications for the social-feed and badge subsystems.
/// The core never waits on consumers and never fails because of them.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    BetPlaced {
        bet_id: String,
        user_id: String,
        game_id: String,
        stake: i64,
    },
    BetSettled {
        bet_id: String,
        user_id: String,
        status: BetStatus,
        actual_win: i64,
    },
    TailFadeChanged {
        post_id: String,
        user_id: String,
        action: PickActionKind,
        bet_id: String,
    },
}

/// Optional sink for domain events. A closed or absent channel is not an
/// error; the send is best-effort.
#[derive(Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<DomainEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<DomainEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// No-op sink for callers that don't consume events.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: DomainEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                tracing::debug!("event channel closed, dropping domain event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_sink_is_silent() {
        let sink = EventSink::disabled();
        sink.emit(DomainEvent::BetPlaced {
            bet_id: "b1".to_string(),
            user_id: "u1".to_string(),
            game_id: "g1".to_string(),
            stake: 1000,
        });
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = EventSink::new(tx);
        sink.emit(DomainEvent::BetPlaced {
            bet_id: "b1".to_string(),
            user_id: "u1".to_string(),
            game_id: "g1".to_string(),
            stake: 1000,
        });
        sink.emit(DomainEvent::BetSettled {
            bet_id: "b1".to_string(),
            user_id: "u1".to_string(),
            status: BetStatus::Won,
            actual_win: 910,
        });
        assert!(matches!(
            rx.recv().await,
            Some(DomainEvent::BetPlaced { .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(DomainEvent::BetSettled { .. })
        ));
    }

    #[test]
    fn test_closed_channel_does_not_panic() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<DomainEvent>();
        drop(rx);
        let sink = EventSink::new(tx);
        sink.emit(DomainEvent::TailFadeChanged {
            post_id: "p1".to_string(),
            user_id: "u1".to_string(),
            action: PickActionKind::Tail,
            bet_id: "b1".to_string(),
        });
    }
}
