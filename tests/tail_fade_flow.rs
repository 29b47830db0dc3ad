// Tail/fade end to end: derivation from the original pick, linkage
// bookkeeping, the one-action-per-post guard, and settlement of the pair.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tailbook_core::config::CoreConfig;
use tailbook_core::error::CoreError;
use tailbook_core::events::EventSink;
use tailbook_core::models::{
    Bet, BetStatus, BetType, Game, GameOdds, GameStatus, H2hMarket, PickActionKind, Selection,
    SpreadMarket, TotalMarket,
};
use tailbook_core::service::{
    BetService, PlaceBetRequest, SettlementService, TailFadeRequest, TailFadeService,
};
use tailbook_core::store::{MemoryStore, Store};

fn lakers_celtics() -> Game {
    Game {
        id: "g1".to_string(),
        sport: "basketball".to_string(),
        home_team: "Lakers".to_string(),
        away_team: "Celtics".to_string(),
        commence_time: Utc::now() + Duration::hours(1),
        status: GameStatus::Scheduled,
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

struct Harness {
    bets: BetService,
    tailfade: TailFadeService,
    settlement: SettlementService,
    store: Arc<MemoryStore>,
}

async fn setup() -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.upsert_game(lakers_celtics()).await.unwrap();
    for user in ["author", "actor", "actor2"] {
        store.create_bankroll(user, 100_000).await.unwrap();
    }
    let bets = BetService::new(store.clone(), CoreConfig::default(), EventSink::disabled());
    let tailfade = TailFadeService::new(store.clone(), bets.clone(), EventSink::disabled());
    let settlement = SettlementService::new(store.clone(), EventSink::disabled());
    Harness {
        bets,
        tailfade,
        settlement,
        store,
    }
}

async fn author_spread(h: &Harness) -> Bet {
    h.bets
        .place_bet(PlaceBetRequest {
            user_id: "author".to_string(),
            game_id: "g1".to_string(),
            bet_type: BetType::Spread,
            selection: Selection::Spread {
                team: "Lakers".to_string(),
                line: -5.5,
            },
            stake: 10_000,
            odds: -110,
        })
        .await
        .unwrap()
}

fn req(original: &Bet, user: &str, stake: i64) -> TailFadeRequest {
    TailFadeRequest {
        original_bet_id: original.id.clone(),
        post_id: "post-1".to_string(),
        user_id: user.to_string(),
        stake,
    }
}

#[tokio::test]
async fn tail_and_fade_derive_from_the_same_original() {
    let h = setup().await;
    let original = author_spread(&h).await;

    let tail = h.tailfade.tail(req(&original, "actor", 2_500)).await.unwrap();
    let fade = h
        .tailfade
        .fade(req(&original, "actor2", 7_500))
        .await
        .unwrap();

    // Tail copies verbatim.
    assert_eq!(tail.bet.selection, original.selection);
    assert_eq!(tail.bet.odds, -110);
    // Fade takes the away side's own quote.
    assert_eq!(
        fade.bet.selection,
        Selection::Spread {
            team: "Celtics".to_string(),
            line: 5.5,
        }
    );
    assert_eq!(fade.bet.odds, -105);
    // Stakes chosen independently.
    assert_eq!(tail.bet.stake, 2_500);
    assert_eq!(fade.bet.stake, 7_500);
}

#[tokio::test]
async fn linkage_and_pick_action_are_recorded() {
    let h = setup().await;
    let original = author_spread(&h).await;
    let outcome = h.tailfade.tail(req(&original, "actor", 2_500)).await.unwrap();

    assert!(outcome.link_recorded);
    assert!(outcome.bet.is_tail);
    assert_eq!(
        outcome.bet.original_pick_id.as_deref(),
        Some(original.id.as_str())
    );
    assert!(h.store.pick_action_exists("post-1", "actor").await.unwrap());
    assert_eq!(outcome.action, PickActionKind::Tail);
}

#[tokio::test]
async fn one_action_per_post_per_user() {
    let h = setup().await;
    let original = author_spread(&h).await;
    h.tailfade.tail(req(&original, "actor", 2_500)).await.unwrap();

    // Same user, same post: rejected regardless of action kind.
    assert!(matches!(
        h.tailfade.tail(req(&original, "actor", 2_500)).await,
        Err(CoreError::AlreadyActioned)
    ));
    assert!(matches!(
        h.tailfade.fade(req(&original, "actor", 2_500)).await,
        Err(CoreError::AlreadyActioned)
    ));

    // Other users unaffected.
    assert!(h.tailfade.fade(req(&original, "actor2", 2_500)).await.is_ok());
}

#[tokio::test]
async fn settling_the_game_pays_opposite_sides_of_a_fade() {
    let h = setup().await;
    let original = author_spread(&h).await;
    h.tailfade.tail(req(&original, "actor", 10_000)).await.unwrap();
    h.tailfade
        .fade(req(&original, "actor2", 10_000))
        .await
        .unwrap();

    // Lakers win by 8, covering -5.5: author and tailer win, fader loses.
    let report = h.settlement.settle_game("g1", 110, 102).await.unwrap();
    assert_eq!(report.settled.len(), 3);
    assert!(report.failures.is_empty());

    let author = h.store.get_bankroll("author").await.unwrap();
    let tailer = h.store.get_bankroll("actor").await.unwrap();
    let fader = h.store.get_bankroll("actor2").await.unwrap();
    assert_eq!(author.balance, 109_090);
    assert_eq!(tailer.balance, 109_090);
    assert_eq!(fader.balance, 90_000);
    assert_eq!(fader.loss_count, 1);

    let fade_bet = h.store.get_bet("bet-3").await.unwrap().unwrap();
    assert_eq!(fade_bet.status, BetStatus::Lost);
    assert!(fade_bet.is_fade);
}

#[tokio::test]
async fn fade_of_a_narrow_cover_beats_the_tail() {
    let h = setup().await;
    let original = author_spread(&h).await;
    h.tailfade
        .fade(req(&original, "actor2", 10_000))
        .await
        .unwrap();

    // Lakers win by 3: -5.5 misses, Celtics +5.5 covers.
    h.settlement.settle_game("g1", 105, 102).await.unwrap();

    let author = h.store.get_bankroll("author").await.unwrap();
    let fader = h.store.get_bankroll("actor2").await.unwrap();
    assert_eq!(author.balance, 90_000);
    // Fade won at its own -105: floor(10000 * 100 / 105) = 9_523.
    assert_eq!(fader.balance, 90_000 + 10_000 + 9_523);
}

#[tokio::test]
async fn tail_of_a_live_game_pick_is_allowed() {
    let h = setup().await;
    let original = author_spread(&h).await;

    let mut game = lakers_celtics();
    game.commence_time = Utc::now() - Duration::minutes(10);
    game.status = GameStatus::Live;
    h.store.upsert_game(game).await.unwrap();

    assert!(h.tailfade.tail(req(&original, "actor", 2_500)).await.is_ok());
}
