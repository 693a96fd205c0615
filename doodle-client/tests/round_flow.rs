//! End-to-end round scenarios through the coordinator handle.

use std::sync::Arc;
use std::time::Duration;

use doodle_client::{
    Clock, Collaborators, Coordinator, CoordinatorError, CoordinatorHandle, GameConfig,
    ManualClock, MemoryScoreStore, MockChannel, MockWordSource, Spectator,
};
use doodle_core::{BrushStyle, Disposition, ReplaySurface, RoundError};
use doodle_types::{
    CanvasEvent, NamedColor, RoundEvent, RoundPhase, StrokeColor, StrokeFrame, StrokeMode,
    StrokeSegment, Timestamp,
};
use tokio::sync::broadcast;

struct Game {
    handle: CoordinatorHandle,
    scores: MemoryScoreStore,
    channel: MockChannel,
    clock: ManualClock,
}

async fn game(words: &[&str]) -> Game {
    let scores = MemoryScoreStore::new();
    let channel = MockChannel::new();
    let clock = ManualClock::new(Timestamp::from_secs(50_000));

    let mut config = GameConfig::default();
    config.canvas.width = 80;
    config.canvas.height = 60;

    let handle = Coordinator::spawn(
        &config,
        Collaborators {
            words: Arc::new(MockWordSource::with_words(words.iter().copied())),
            scores: Arc::new(scores.clone()),
            channel: Arc::new(channel.clone()),
            clock: Arc::new(clock.clone()),
        },
    )
    .await
    .unwrap();

    Game {
        handle,
        scores,
        channel,
        clock,
    }
}

/// Drain the feed until a phase-changing event arrives.
async fn next_transition(events: &mut broadcast::Receiver<RoundEvent>) -> RoundEvent {
    loop {
        match events.recv().await.unwrap() {
            RoundEvent::Tick { .. } | RoundEvent::Warning { .. } => continue,
            event => return event,
        }
    }
}

#[tokio::test]
async fn correct_guess_solves_once() {
    let g = game(&["cat"]).await;
    let mut events = g.handle.subscribe();

    g.handle.start_round(Some(60)).await.unwrap();
    assert!(matches!(
        next_transition(&mut events).await,
        RoundEvent::Started { .. }
    ));

    assert!(g.handle.submit_guess("ana", "CAT ").await.unwrap());
    match next_transition(&mut events).await {
        RoundEvent::Solved {
            author,
            word,
            score_delta,
            score,
            ..
        } => {
            assert_eq!(author, "ana");
            assert_eq!(word, "cat");
            assert_eq!(score_delta, 10);
            assert_eq!(score, 10);
        }
        other => panic!("expected Solved, got {:?}", other),
    }

    let err = g.handle.submit_guess("bob", "cat").await.unwrap_err();
    assert_eq!(
        err.round_error(),
        Some(&RoundError::RoundNotActive {
            phase: RoundPhase::Solved
        })
    );

    let snapshot = g.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.score, 10);
    assert_eq!(snapshot.guesses.len(), 1);
    assert_eq!(g.scores.stored(), Some(10));
}

#[tokio::test]
async fn round_expires_with_reveal() {
    let g = game(&["bridge"]).await;
    let mut events = g.handle.subscribe();

    g.handle.start_round(Some(30)).await.unwrap();
    next_transition(&mut events).await;

    g.clock.advance(Duration::from_millis(29_999));
    g.handle.poll().await.unwrap();
    assert_eq!(g.handle.snapshot().await.unwrap().phase, RoundPhase::Active);

    g.clock.advance(Duration::from_millis(1));
    g.handle.poll().await.unwrap();

    assert!(matches!(
        next_transition(&mut events).await,
        RoundEvent::Expired { word, .. } if word == "bridge"
    ));

    let snapshot = g.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, RoundPhase::Expired);
    let reveal = snapshot.guesses.last().unwrap();
    assert!(reveal.is_system());
    assert!(!reveal.matched_word);
    assert!(reveal.text.contains("bridge"));

    // Further polls never expire twice
    g.clock.advance(Duration::from_secs(5));
    g.handle.poll().await.unwrap();
    assert_eq!(g.handle.snapshot().await.unwrap().guesses.len(), 1);
}

#[tokio::test]
async fn warning_fires_once() {
    let g = game(&["moon"]).await;
    let mut events = g.handle.subscribe();
    g.handle.start_round(Some(30)).await.unwrap();

    for _ in 0..300 {
        g.clock.advance(Duration::from_millis(100));
        g.handle.poll().await.unwrap();
    }
    g.handle.shutdown().await.unwrap();

    let mut warnings = 0;
    let mut expiries = 0;
    let mut last_tick = u32::MAX;
    while let Ok(event) = events.try_recv() {
        match event {
            RoundEvent::Warning { remaining_secs } => {
                assert_eq!(remaining_secs, 10);
                warnings += 1;
            }
            RoundEvent::Expired { .. } => expiries += 1,
            RoundEvent::Tick { remaining_secs, .. } => {
                assert!(remaining_secs < last_tick);
                last_tick = remaining_secs;
            }
            _ => {}
        }
    }
    assert_eq!(warnings, 1);
    assert_eq!(expiries, 1);
    assert_eq!(last_tick, 1);
}

#[tokio::test]
async fn observer_canvas_matches_drawer() {
    let g = game(&["house"]).await;
    let mut events = g.handle.subscribe();
    let mut observer = Spectator::new(ReplaySurface::new(80, 60).unwrap(), 16);

    g.handle.start_round(Some(60)).await.unwrap();
    observer.on_round_event(&next_transition(&mut events).await);

    let style = BrushStyle::new(StrokeColor::Named(NamedColor::Orange), 4.0);
    g.handle.begin_stroke(0.0, 0.0).await.unwrap();
    let first = g.handle.extend_stroke(10.0, 10.0, style).await.unwrap().unwrap();
    let second = g.handle.extend_stroke(20.0, 5.0, style).await.unwrap().unwrap();
    g.handle.end_stroke().await.unwrap();

    assert_eq!(first.from_point(), (0.0, 0.0));
    assert_eq!(first.to_point(), (10.0, 10.0));
    assert_eq!(second.from_point(), (10.0, 10.0));
    assert_eq!(second.to_point(), (20.0, 5.0));

    let sent = g.channel.sent_messages();
    assert_eq!(sent.len(), 2);
    for bytes in &sent {
        assert_eq!(observer.receive_bytes(bytes).unwrap(), Disposition::Ready);
    }

    let drawer = g.handle.surface().await.unwrap();
    assert_eq!(&drawer, observer.surface());
    assert_eq!(
        g.handle.snapshot().await.unwrap().surface_checksum,
        observer.surface().checksum()
    );
}

#[tokio::test]
async fn observer_survives_reordering_and_duplicates() {
    let g = game(&["star"]).await;
    let mut events = g.handle.subscribe();
    let mut observer = Spectator::new(ReplaySurface::new(80, 60).unwrap(), 16);

    g.handle.start_round(Some(60)).await.unwrap();
    observer.on_round_event(&next_transition(&mut events).await);

    let pen = BrushStyle::new(StrokeColor::Named(NamedColor::Blue), 3.0);
    g.handle.begin_stroke(5.0, 5.0).await.unwrap();
    for (x, y) in [(30.0, 5.0), (30.0, 40.0), (5.0, 40.0)] {
        g.handle.extend_stroke(x, y, pen).await.unwrap();
    }
    g.handle.end_stroke().await.unwrap();
    g.handle.begin_stroke(40.0, 20.0).await.unwrap();
    g.handle
        .extend_stroke(60.0, 20.0, BrushStyle::eraser(5.0))
        .await
        .unwrap();

    let mut sent = g.channel.sent_messages();
    assert_eq!(sent.len(), 4);
    sent.swap(0, 2);
    sent.insert(1, sent[3].clone());

    for bytes in &sent {
        observer.receive_bytes(bytes).unwrap();
    }

    assert_eq!(observer.applied(), 4);
    assert!(observer.gaps().is_empty());
    assert_eq!(&g.handle.surface().await.unwrap(), observer.surface());
}

#[tokio::test]
async fn clear_is_replicated() {
    let g = game(&["fish"]).await;
    let mut events = g.handle.subscribe();
    let mut observer = Spectator::new(ReplaySurface::new(80, 60).unwrap(), 16);

    g.handle.start_round(Some(60)).await.unwrap();
    observer.on_round_event(&next_transition(&mut events).await);

    g.handle.begin_stroke(0.0, 0.0).await.unwrap();
    g.handle
        .extend_stroke(50.0, 50.0, BrushStyle::default())
        .await
        .unwrap();
    g.handle.clear_canvas().await.unwrap();

    let frames = g.channel.sent_frames().unwrap();
    assert!(matches!(frames.last().unwrap().event, CanvasEvent::Clear));
    for frame in frames {
        observer.receive(frame);
    }

    assert!(observer.surface().is_blank());
    assert!(g.handle.surface().await.unwrap().is_blank());
}

#[tokio::test]
async fn lobby_cancels_running_round() {
    let g = game(&["train", "boat"]).await;
    let mut events = g.handle.subscribe();

    g.handle.start_round(Some(30)).await.unwrap();
    g.handle.submit_guess("ana", "bus").await.unwrap();
    g.handle.submit_guess("ana", "train").await.unwrap();
    assert_eq!(g.scores.stored(), Some(10));

    g.handle.start_round(Some(30)).await.unwrap();
    g.handle.begin_stroke(1.0, 1.0).await.unwrap();

    g.handle.return_to_lobby().await.unwrap();
    assert_eq!(g.handle.countdown(), None);

    let snapshot = g.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, RoundPhase::Idle);
    assert_eq!(snapshot.round, None);
    assert_eq!(snapshot.word, None);
    assert!(snapshot.guesses.is_empty());
    assert_eq!(snapshot.score, 0);
    assert_eq!(g.scores.stored(), None);

    // The abandoned timer never fires
    g.clock.advance(Duration::from_secs(60));
    g.handle.poll().await.unwrap();
    g.handle.shutdown().await.unwrap();

    let mut saw_lobby = false;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, RoundEvent::Expired { .. }));
        saw_lobby |= matches!(event, RoundEvent::ReturnedToLobby);
    }
    assert!(saw_lobby);
}

#[tokio::test]
async fn lobby_drops_stroke_in_progress() {
    let g = game(&["key", "door"]).await;

    g.handle.start_round(Some(60)).await.unwrap();
    g.handle.begin_stroke(10.0, 10.0).await.unwrap();
    g.handle.return_to_lobby().await.unwrap();

    g.handle.start_round(Some(60)).await.unwrap();
    // Without a fresh pen-down the old anchor must not resurface
    assert_eq!(
        g.handle
            .extend_stroke(20.0, 20.0, BrushStyle::default())
            .await
            .unwrap(),
        None
    );
    assert!(g.channel.sent_messages().is_empty());
}

#[tokio::test]
async fn start_while_active_is_rejected() {
    let g = game(&["cake", "apple"]).await;
    let first = g.handle.start_round(Some(60)).await.unwrap();

    let err = g.handle.start_round(Some(60)).await.unwrap_err();
    assert_eq!(err.round_error(), Some(&RoundError::RoundInProgress));

    let snapshot = g.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.round, Some(first));
    assert_eq!(g.handle.secret_word().await.unwrap().as_deref(), Some("cake"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_guesses_award_once() {
    let g = game(&["piano"]).await;
    g.handle.start_round(Some(60)).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let handle = g.handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.submit_guess(format!("player{}", i), "piano").await
        }));
    }

    let mut winners = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(true) => winners += 1,
            Ok(false) => panic!("correct guess not matched"),
            Err(e) => {
                assert_eq!(
                    e.round_error(),
                    Some(&RoundError::RoundNotActive {
                        phase: RoundPhase::Solved
                    })
                );
                rejected += 1;
            }
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(rejected, 15);

    let snapshot = g.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.score, 10);
    assert_eq!(snapshot.guesses.len(), 1);
    assert_eq!(g.scores.save_count(), 1);
}

#[tokio::test]
async fn countdown_is_readable_without_the_task() {
    let g = game(&["ocean"]).await;
    g.handle.start_round(Some(90)).await.unwrap();

    let countdown = g.handle.countdown().unwrap();
    g.clock.advance(Duration::from_millis(41_300));
    assert_eq!(countdown.remaining_secs(g.clock.now()), 49);
    assert_eq!(g.handle.remaining_secs(), Some(49));

    // Same answer however many times it is asked
    for _ in 0..50 {
        assert_eq!(g.handle.remaining_secs(), Some(49));
    }
}

#[tokio::test]
async fn frames_from_a_finished_round_are_ignored() {
    let g = game(&["sun", "moon"]).await;
    let mut events = g.handle.subscribe();
    let mut observer = Spectator::new(ReplaySurface::new(80, 60).unwrap(), 16);

    g.handle.start_round(Some(60)).await.unwrap();
    observer.on_round_event(&next_transition(&mut events).await);
    g.handle.begin_stroke(0.0, 30.0).await.unwrap();
    g.handle
        .extend_stroke(
            80.0,
            30.0,
            BrushStyle {
                color: StrokeColor::Named(NamedColor::Red),
                width: 6.0,
                mode: StrokeMode::Paint,
            },
        )
        .await
        .unwrap();
    let stale = g.channel.sent_messages();

    g.handle.submit_guess("ana", "sun").await.unwrap();
    observer.on_round_event(&next_transition(&mut events).await);
    g.handle.start_round(Some(60)).await.unwrap();
    observer.on_round_event(&next_transition(&mut events).await);

    assert_eq!(
        observer.receive_bytes(&stale[0]).unwrap(),
        Disposition::ForeignRound
    );
    assert_eq!(
        g.handle.receive_bytes(&stale[0]).await.unwrap(),
        Disposition::ForeignRound
    );
    assert!(observer.surface().is_blank());
}

#[tokio::test]
async fn last_sequence_number_survives_round_end() {
    let g = game(&["cat"]).await;
    let round = g.handle.start_round(Some(60)).await.unwrap();

    let frame = StrokeFrame {
        round,
        seq: u64::MAX,
        event: CanvasEvent::Clear,
    };
    assert_eq!(
        g.handle.receive_bytes(&frame.to_bytes().unwrap()).await.unwrap(),
        Disposition::Held
    );

    // Solving flushes the held frame
    assert!(g.handle.submit_guess("ana", "cat").await.unwrap());

    let snapshot = g.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, RoundPhase::Solved);
    assert_eq!(snapshot.score, 10);
    g.handle.return_to_lobby().await.unwrap();
}

#[tokio::test]
async fn malformed_typed_frame_is_rejected() {
    let g = game(&["cat"]).await;
    let round = g.handle.start_round(Some(60)).await.unwrap();

    let frame = StrokeFrame {
        round,
        seq: 1,
        event: CanvasEvent::Segment(StrokeSegment {
            from_x: 0.0,
            from_y: 0.0,
            to_x: 40.0,
            to_y: 30.0,
            color: StrokeColor::Named(NamedColor::Black),
            width: f32::INFINITY,
            mode: StrokeMode::Paint,
        }),
    };

    let err = g.handle.receive_frame(frame).await.unwrap_err();
    assert!(matches!(err, CoordinatorError::Wire(_)));
    assert!(g.handle.surface().await.unwrap().is_blank());
}
