// crates/duel-core/tests/engine_dispatch.rs
//
// Dispatch loop behaviour: routing of replies, broadcasts, queue order,
// readiness gating and roster validation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{eventually, eventually_rules, seat, start, table, CountingRules, Event, RecordingPlayer};
use duel_core::{Action, Game, GameOutcome, GameState, PlayerBounds, PlayerId, PlayerRef, SetupError};

const P0: PlayerId = PlayerId(0);
const P1: PlayerId = PlayerId(1);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn out_of_turn_move_is_refused_to_sender_only() {
    let (engine, game) = table(CountingRules::new(10).starting_with(1));
    let (p0, p1) = (RecordingPlayer::new(), RecordingPlayer::new());
    seat(&game, &[p0.clone(), p1.clone()]);
    let _play = start(&engine);

    p0.send(Action::play(P0, 2));

    assert!(eventually(|| p0.saw(&Event::NotYourMove)).await);
    assert_eq!(engine.inspect(|r| r.total).await, 0);
    assert!(!p1.saw(&Event::NotYourMove));
    assert!(!p0.saw(&Event::StateChanged));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn illegal_move_leaves_state_untouched() {
    let (engine, game) = table(CountingRules::new(10));
    let (p0, p1) = (RecordingPlayer::new(), RecordingPlayer::new());
    seat(&game, &[p0.clone(), p1.clone()]);
    let _play = start(&engine);

    p0.send(Action::play(P0, 7));

    assert!(eventually(|| p0.saw(&Event::IllegalMove)).await);
    assert_eq!(engine.inspect(|r| r.total).await, 0);
    assert!(!p1.saw(&Event::IllegalMove));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn legal_move_is_broadcast_as_state_change() {
    let (engine, game) = table(CountingRules::new(10));
    let (p0, p1) = (RecordingPlayer::new(), RecordingPlayer::new());
    seat(&game, &[p0.clone(), p1.clone()]);
    let _play = start(&engine);

    p0.send(Action::play(P0, 2));

    assert!(eventually(|| p0.saw(&Event::StateChanged) && p1.saw(&Event::StateChanged)).await);
    assert_eq!(engine.inspect(|r| (r.total, r.turn)).await, (2, 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn idle_queue_requests_moves_from_eligible_players() {
    let (engine, game) = table(CountingRules::new(10).starting_with(1));
    let (p0, p1) = (RecordingPlayer::new(), RecordingPlayer::new());
    seat(&game, &[p0.clone(), p1.clone()]);
    let _play = start(&engine);

    assert!(eventually(|| p1.count(&Event::RequestMove) >= 2).await);
    assert!(!p0.saw(&Event::RequestMove));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reaching_the_end_runs_the_closing_handshake() {
    let (engine, game) = table(CountingRules::new(3));
    let (p0, p1) = (RecordingPlayer::new(), RecordingPlayer::new());
    seat(&game, &[p0.clone(), p1.clone()]);
    let play = start(&engine);

    p0.send(Action::play(P0, 3));

    let outcome = tokio::time::timeout(Duration::from_secs(5), play)
        .await
        .expect("game did not finish")
        .expect("dispatch task panicked");
    assert_eq!(outcome, GameOutcome::Finished);

    for p in [&p0, &p1] {
        assert!(eventually(|| p.saw(&Event::FinishUp)).await);
        assert!(p.saw(&Event::GameIsOver));
        assert!(p.saw(&Event::StateChanged));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_producer_order_is_preserved() {
    let (engine, game) = table(CountingRules::new(u32::MAX).free_for_all());
    let (p0, p1) = (RecordingPlayer::new(), RecordingPlayer::new());
    seat(&game, &[p0.clone(), p1.clone()]);

    for n in 1..=100 {
        p0.send(Action::play(P0, n));
    }
    let _play = start(&engine);

    assert!(eventually_rules(&engine, |r| r.applied.len() == 100).await);
    let order: Vec<u32> = engine.inspect(|r| r.applied.iter().map(|(_, m)| *m).collect()).await;
    assert_eq!(order, (1..=100).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_keep_their_own_order() {
    let (engine, game) = table(CountingRules::new(u32::MAX).free_for_all());
    let (p0, p1) = (RecordingPlayer::new(), RecordingPlayer::new());
    seat(&game, &[p0.clone(), p1.clone()]);
    let _play = start(&engine);

    let producers: Vec<_> = (0..4u32)
        .map(|tag| {
            let game = Arc::clone(&game);
            std::thread::spawn(move || {
                let source = PlayerId::from_index(tag as usize % 2);
                for n in 0..50 {
                    game.apply_action(Action::play(source, tag * 1000 + n));
                }
            })
        })
        .collect();
    for p in producers {
        p.join().expect("producer panicked");
    }

    assert!(eventually_rules(&engine, |r| r.applied.len() == 200).await);
    let applied: Vec<u32> = engine.inspect(|r| r.applied.iter().map(|(_, m)| *m).collect()).await;
    for tag in 0..4u32 {
        let mine: Vec<u32> = applied.iter().copied().filter(|m| m / 1000 == tag).collect();
        assert_eq!(mine, (0..50).map(|n| tag * 1000 + n).collect::<Vec<_>>(), "producer {tag}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pending_count_tracks_the_queue() {
    let (engine, game) = table(CountingRules::new(u32::MAX).free_for_all());
    let (p0, p1) = (RecordingPlayer::new(), RecordingPlayer::new());
    seat(&game, &[p0.clone(), p1.clone()]);

    p0.send(Action::play(P0, 1));
    p1.send(Action::play(P1, 1));
    p1.send(Action::Null { source: P1 });
    assert_eq!(engine.pending_actions(), 3);

    let _play = start(&engine);
    assert!(eventually(|| engine.pending_actions() == 0).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn nothing_is_dispatched_until_everyone_is_ready() {
    let (engine, game) = table(CountingRules::new(10));
    let (p0, p1) = (RecordingPlayer::new(), RecordingPlayer::not_ready());
    seat(&game, &[p0.clone(), p1.clone()]);

    p0.send(Action::play(P0, 1));
    let _play = start(&engine);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(engine.pending_actions(), 1);
    assert!(engine.inspect(|r| r.initialized && !r.ready_hook_ran).await);
    assert!(!p0.saw(&Event::RequestMove));

    p1.set_ready(true);
    assert!(eventually_rules(&engine, |r| r.total == 1 && r.ready_hook_ran).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn play_game_runs_once() {
    let (engine, game) = table(CountingRules::new(10));
    seat(&game, &[RecordingPlayer::new(), RecordingPlayer::new()]);
    let _play = start(&engine);

    assert!(eventually(|| engine.is_started()).await);
    assert_eq!(engine.play_game().await, GameOutcome::AlreadyStarted);
}

#[tokio::test]
async fn play_game_without_roster_does_not_start() {
    let (engine, _game) = table(CountingRules::new(10));

    assert_eq!(engine.play_game().await, GameOutcome::NotSeated);
    assert!(!engine.is_started());
}

#[tokio::test]
async fn roster_is_validated_against_bounds() {
    let (engine, game) = table(CountingRules::new(10));
    let player = || Some(RecordingPlayer::new() as PlayerRef<u32, u32>);

    assert_eq!(game.set_players(vec![]), Err(SetupError::NoPlayers));
    assert_eq!(game.set_players(vec![player(), None]), Err(SetupError::EmptySeat));
    assert_eq!(
        game.set_players(vec![player()]),
        Err(SetupError::NotEnoughPlayers { min: 2, got: 1 })
    );
    assert_eq!(
        game.set_players(vec![player(), player(), player()]),
        Err(SetupError::TooManyPlayers { max: 2, got: 3 })
    );

    assert_eq!(engine.player_count(), 0);
    assert_eq!(game.set_players(vec![player(), player()]), Ok(()));
    assert_eq!(engine.player_count(), 2);
    assert_eq!(game.set_players(vec![player(), player()]), Err(SetupError::AlreadySeated));
}

#[tokio::test]
async fn roster_longer_than_the_table_is_rejected() {
    let bounds = PlayerBounds {
        min: 1,
        max: 2,
        empty_seats_allowed: true,
    };
    let (engine, game) = table(CountingRules::new(10).with_bounds(bounds));
    let player = || Some(RecordingPlayer::new() as PlayerRef<u32, u32>);

    // One player, but in a seat the game does not have.
    assert_eq!(
        game.set_players(vec![None, None, None, None, player()]),
        Err(SetupError::TooManyPlayers { max: 2, got: 5 })
    );
    assert_eq!(engine.player_count(), 0);

    assert_eq!(game.set_players(vec![None, player()]), Ok(()));
    assert_eq!(engine.player_count(), 1);
}

#[test]
fn setup_errors_read_like_user_messages() {
    assert_eq!(SetupError::NoPlayers.to_string(), "no players selected");
    assert_eq!(SetupError::EmptySeat.to_string(), "all player-slots must be filled");
    assert!(SetupError::NotEnoughPlayers { min: 2, got: 1 }
        .to_string()
        .starts_with("not enough players for the game"));
}

#[tokio::test]
async fn identity_query_reports_the_seat() {
    let (_engine, game) = table(CountingRules::new(10));
    seat(&game, &[RecordingPlayer::new(), RecordingPlayer::new()]);

    assert_eq!(game.get_state(P1, -1).await, Ok(GameState::Identity(P1)));
    assert_eq!(
        game.get_state(PlayerId(5), -1).await,
        Ok(GameState::Identity(PlayerId::UNSEATED))
    );
    assert_eq!(game.get_state(P0, 0).await, Ok(GameState::Snapshot(0)));
}
