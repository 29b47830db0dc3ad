use crate::engine::{outcome, BetOutcome};
use crate::error::CoreError;
use crate::events::{DomainEvent, EventSink};
use crate::models::{Bet, BetType};
use crate::store::{SettleAttempt, Store};
use chrono::Utc;
use std::sync::Arc;

/// What one settlement run did. Failures are per-bet and non-blocking:
/// partial progress stands and the failed bets are retried on the next run.
#[derive(Debug, Default)]
pub struct SettlementReport {
    pub game_id: String,
    pub settled: Vec<Bet>,
    /// Bets already in a terminal state, skipped rather than re-credited.
    pub skipped: usize,
    pub failures: Vec<(String, CoreError)>,
}

/// Resolves every pending bet on a completed game exactly once.
#[derive(Clone)]
pub struct SettlementService {
    store: Arc<dyn Store>,
    events: EventSink,
}

impl SettlementService {
    pub fn new(store: Arc<dyn Store>, events: EventSink) -> Self {
        Self { store, events }
    }

    /// Record final scores and settle the game's pending bets. Safe to rerun:
    /// game completion is idempotent and each bet leaves `Pending` at most
    /// once, so a retry only touches bets the previous run missed.
    pub async fn settle_game(
        &self,
        game_id: &str,
        home_score: u32,
        away_score: u32,
    ) -> Result<SettlementReport, CoreError> {
        let game = self
            .store
            .complete_game(game_id, home_score, away_score)
            .await?;
        // The recorded scores are authoritative from the first completion on.
        let home_score = game.home_score.unwrap_or(home_score);
        let away_score = game.away_score.unwrap_or(away_score);

        let pending = self.store.pending_bets_for_game(game_id).await?;
        tracing::info!(
            game_id = %game_id,
            home_score = home_score,
            away_score = away_score,
            pending = pending.len(),
            "settling game"
        );

        let mut report = SettlementReport {
            game_id: game_id.to_string(),
            ..Default::default()
        };

        for bet in pending {
            let outcome = match outcome::settle_outcome(&bet, &game, home_score, away_score) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(bet_id = %bet.id, error = %err, "cannot resolve bet outcome");
                    report.failures.push((bet.id, err));
                    continue;
                }
            };

            if bet.bet_type == BetType::Moneyline && outcome == BetOutcome::Push {
                // Tied final on a moneyline: not expected for the sports we
                // carry, so make it visible when a feed produces one.
                tracing::warn!(
                    bet_id = %bet.id,
                    game_id = %game_id,
                    "moneyline tie settled as push"
                );
            }

            match self.store.settle_bet(&bet.id, outcome, Utc::now()).await {
                Ok(SettleAttempt::Settled(settled)) => {
                    tracing::info!(
                        bet_id = %settled.id,
                        user_id = %settled.user_id,
                        status = ?settled.status,
                        actual_win = settled.actual_win.unwrap_or(0),
                        "bet settled"
                    );
                    self.events.emit(DomainEvent::BetSettled {
                        bet_id: settled.id.clone(),
                        user_id: settled.user_id.clone(),
                        status: settled.status,
                        actual_win: settled.actual_win.unwrap_or(0),
                    });
                    report.settled.push(settled);
                }
                Ok(SettleAttempt::AlreadySettled) => report.skipped += 1,
                Err(err) => {
                    tracing::error!(bet_id = %bet.id, error = %err, "bet settlement failed");
                    report.failures.push((bet.id, err));
                }
            }
        }

        tracing::info!(
            game_id = %game_id,
            settled = report.settled.len(),
            skipped = report.skipped,
            failures = report.failures.len(),
            "settlement run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::models::{
        BetStatus, Game, GameOdds, GameStatus, H2hMarket, Selection, SpreadMarket, TotalMarket,
        TotalSide,
    };
    use crate::service::placement::{BetService, PlaceBetRequest};
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn lakers_celtics() -> Game {
        Game {
            id: "g1".to_string(),
            sport: "basketball".to_string(),
            home_team: "Lakers".to_string(),
            away_team: "Celtics".to_string(),
            commence_time: Utc::now() - Duration::hours(3),
            status: GameStatus::Live,
            home_score: None,
            away_score: None,
            odds: Some(GameOdds {
                spreads: Some(SpreadMarket {
                    home_line: -5.5,
                    home_odds: -110,
                    away_line: 5.5,
                    away_odds: -105,
                }),
                totals: Some(TotalMarket {
                    line: 212.0,
                    over_odds: -110,
                    under_odds: -110,
                }),
                h2h: Some(H2hMarket {
                    home_odds: -200,
                    away_odds: 170,
                }),
            }),
        }
    }

    async fn setup() -> (SettlementService, BetService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.upsert_game(lakers_celtics()).await.unwrap();
        store.create_bankroll("u1", 100_000).await.unwrap();
        let bets = BetService::new(store.clone(), CoreConfig::default(), EventSink::disabled());
        let service = SettlementService::new(store.clone(), EventSink::disabled());
        (service, bets, store)
    }

    fn spread_request(stake: i64) -> PlaceBetRequest {
        PlaceBetRequest {
            user_id: "u1".to_string(),
            game_id: "g1".to_string(),
            bet_type: BetType::Spread,
            selection: Selection::Spread {
                team: "Lakers".to_string(),
                line: -5.5,
            },
            stake,
            odds: -110,
        }
    }

    #[tokio::test]
    async fn test_won_bet_credits_stake_plus_winnings_once() {
        let (service, bets, store) = setup().await;
        bets.place_bet(spread_request(10_000)).await.unwrap();
        assert_eq!(store.get_bankroll("u1").await.unwrap().balance, 90_000);

        // Lakers win by 8, covering -5.5.
        let report = service.settle_game("g1", 110, 102).await.unwrap();
        assert_eq!(report.settled.len(), 1);
        assert_eq!(report.settled[0].status, BetStatus::Won);
        assert_eq!(report.settled[0].actual_win, Some(9_090));
        assert_eq!(
            store.get_bankroll("u1").await.unwrap().balance,
            90_000 + 19_090
        );
    }

    #[tokio::test]
    async fn test_resettlement_is_a_no_op() {
        let (service, bets, store) = setup().await;
        bets.place_bet(spread_request(10_000)).await.unwrap();
        service.settle_game("g1", 110, 102).await.unwrap();
        let balance_after_first = store.get_bankroll("u1").await.unwrap().balance;

        let report = service.settle_game("g1", 110, 102).await.unwrap();
        assert!(report.settled.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(
            store.get_bankroll("u1").await.unwrap().balance,
            balance_after_first
        );
    }

    #[tokio::test]
    async fn test_push_returns_stake_only() {
        let (service, bets, store) = setup().await;
        bets.place_bet(PlaceBetRequest {
            user_id: "u1".to_string(),
            game_id: "g1".to_string(),
            bet_type: BetType::Total,
            selection: Selection::Total {
                side: TotalSide::Over,
                line: 212.0,
            },
            stake: 10_000,
            odds: -110,
        })
        .await
        .unwrap();

        // 110 + 102 lands exactly on the 212 line.
        let report = service.settle_game("g1", 110, 102).await.unwrap();
        assert_eq!(report.settled[0].status, BetStatus::Push);
        assert_eq!(report.settled[0].actual_win, Some(10_000));
        assert_eq!(store.get_bankroll("u1").await.unwrap().balance, 100_000);
    }

    #[tokio::test]
    async fn test_lost_bet_credits_nothing() {
        let (service, bets, store) = setup().await;
        bets.place_bet(spread_request(10_000)).await.unwrap();

        // Lakers win by 3, failing to cover.
        let report = service.settle_game("g1", 105, 102).await.unwrap();
        assert_eq!(report.settled[0].status, BetStatus::Lost);
        assert_eq!(report.settled[0].actual_win, Some(0));
        assert_eq!(store.get_bankroll("u1").await.unwrap().balance, 90_000);
    }

    #[tokio::test]
    async fn test_mixed_outcomes_settle_independently() {
        let (service, bets, store) = setup().await;
        bets.place_bet(spread_request(10_000)).await.unwrap();
        bets.place_bet(PlaceBetRequest {
            user_id: "u1".to_string(),
            game_id: "g1".to_string(),
            bet_type: BetType::Moneyline,
            selection: Selection::Moneyline {
                team: "Celtics".to_string(),
            },
            stake: 5_000,
            odds: 170,
        })
        .await
        .unwrap();

        let report = service.settle_game("g1", 110, 102).await.unwrap();
        assert_eq!(report.settled.len(), 2);

        let bankroll = store.get_bankroll("u1").await.unwrap();
        assert_eq!(bankroll.win_count, 1);
        assert_eq!(bankroll.loss_count, 1);
        // 85k after both stakes, plus 19_090 for the spread win.
        assert_eq!(bankroll.balance, 85_000 + 19_090);
    }

    #[tokio::test]
    async fn test_one_bad_bet_does_not_block_the_rest() {
        let (service, bets, store) = setup().await;
        bets.place_bet(spread_request(10_000)).await.unwrap();

        // Hand-craft a bet whose team matches neither side of the game.
        let mut orphan = store.get_bet("bet-1").await.unwrap().unwrap();
        orphan.selection = Selection::Spread {
            team: "Warriors".to_string(),
            line: -2.5,
        };
        let orphan = store.place_bet(orphan).await.unwrap();

        let report = service.settle_game("g1", 110, 102).await.unwrap();
        assert_eq!(report.settled.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, orphan.id);
        assert!(matches!(
            report.failures[0].1,
            CoreError::InvalidSelection
        ));
    }

    #[tokio::test]
    async fn test_settling_unknown_game_fails() {
        let (service, _, _) = setup().await;
        assert!(matches!(
            service.settle_game("g404", 1, 0).await,
            Err(CoreError::GameNotFound(_))
        ));
    }
}
