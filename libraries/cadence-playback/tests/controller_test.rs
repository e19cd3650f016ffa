//! Integration tests for the playback controller
//!
//! Drives the controller with a manual clock and checks navigation, timing
//! and lifecycle events end to end.

use cadence_playback::{
    Clock, ManualClock, PlaybackConfig, PlaybackController, PlaybackError, PlaybackEvent,
    PlaybackEventKind, PlaybackEventSink, PlaybackHistory, PlaylistSummary, QueueSource, Song,
    SongId,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ===== Test Helpers =====

struct Fixture {
    controller: PlaybackController,
    clock: ManualClock,
    history: Arc<PlaybackHistory>,
}

fn songs(durations: &[f64]) -> Vec<Song> {
    durations
        .iter()
        .enumerate()
        .map(|(i, &d)| Song::new(i as i64 + 1, format!("Song {}", i + 1), "Artist", d))
        .collect()
}

fn fixture(durations: &[f64]) -> Fixture {
    fixture_with(QueueSource::new(songs(durations)), PlaybackConfig::default())
}

fn fixture_with(source: QueueSource, config: PlaybackConfig) -> Fixture {
    let clock = ManualClock::new();
    let history = Arc::new(PlaybackHistory::new(100));
    let controller = PlaybackController::builder(source)
        .config(config)
        .clock(clock.clone())
        .rng(StdRng::seed_from_u64(42))
        .sink(history.clone())
        .build();

    Fixture {
        controller,
        clock,
        history,
    }
}

fn events(history: &PlaybackHistory) -> Vec<(PlaybackEventKind, i64)> {
    history
        .records()
        .into_iter()
        .map(|r| (r.event.kind, r.event.song_id.0))
        .collect()
}

/// Sink that always fails, counting attempts
#[derive(Default)]
struct FailingSink {
    attempts: AtomicUsize,
}

impl PlaybackEventSink for FailingSink {
    fn record(&self, _event: &PlaybackEvent) -> cadence_playback::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(PlaybackError::SinkUnavailable("offline".to_string()))
    }
}

// ===== Play / Pause / Seek =====

#[test]
fn play_then_tick_at_anchor_leaves_progress_unchanged() {
    let mut f = fixture(&[180.0]);
    f.controller.seek(20.0);
    f.controller.play();

    let anchor_time = f.controller.state().anchor().unwrap().started_at;
    let state = f.controller.tick(anchor_time);

    assert_eq!(state.progress(), 20.0);
    assert!(state.is_playing());
}

#[test]
fn play_twice_keeps_original_anchor() {
    let mut f = fixture(&[180.0]);
    f.controller.play();
    let first = *f.controller.state().anchor().unwrap();

    f.clock.advance_secs(3.0);
    f.controller.play();

    assert_eq!(f.controller.state().anchor(), Some(&first));
}

#[test]
fn seek_pause_play_preserves_position() {
    let mut f = fixture(&[180.0]);
    f.controller.play();
    f.controller.seek(75.0);
    f.controller.pause();
    assert_eq!(f.controller.state().progress(), 75.0);

    f.clock.advance_secs(10.0);
    let state = f.controller.play();
    assert_eq!(state.progress(), 75.0);
    assert_eq!(state.anchor().unwrap().progress_at_start, 75.0);
}

#[test]
fn seek_out_of_range_is_clamped_across_pause() {
    let mut f = fixture(&[120.0]);
    f.controller.seek(500.0);
    f.controller.pause();
    f.controller.play();
    assert_eq!(f.controller.state().progress(), 120.0);
}

#[test]
fn seek_while_playing_reanchors() {
    let mut f = fixture(&[180.0]);
    f.controller.play();
    f.clock.advance_secs(30.0);

    let state = f.controller.seek(100.0);
    let anchor = state.anchor().unwrap();
    assert_eq!(anchor.started_at, f.clock.now());
    assert_eq!(anchor.progress_at_start, 100.0);

    f.clock.advance_secs(5.0);
    assert_eq!(f.controller.tick(f.clock.now()).progress(), 105.0);
}

#[test]
fn seek_while_paused_keeps_anchor_empty() {
    let mut f = fixture(&[180.0]);
    let state = f.controller.seek(50.0);
    assert!(state.anchor().is_none());
    assert!(!state.is_playing());
}

#[test]
fn toggle_playback_alternates() {
    let mut f = fixture(&[180.0]);
    assert!(f.controller.toggle_playback().is_playing());
    f.clock.advance_secs(2.0);
    let state = f.controller.toggle_playback();
    assert!(!state.is_playing());
    assert_eq!(state.progress(), 2.0);
}

// ===== Ticks =====

#[test]
fn ticks_do_not_accumulate_drift() {
    let mut f = fixture(&[300.0]);
    f.controller.play();

    // Irregular, delayed ticks
    for secs in [0.1, 0.35, 0.36, 2.0, 2.05, 9.99] {
        f.controller.tick(f.clock.at(secs));
    }
    assert!((f.controller.state().progress() - 9.99).abs() < 1e-6);
}

#[test]
fn tick_before_anchor_counts_as_zero_elapsed() {
    let mut f = fixture(&[300.0]);
    f.clock.advance_secs(10.0);
    f.controller.seek(40.0);
    f.controller.play();

    let state = f.controller.tick(f.clock.at(2.0));
    assert_eq!(state.progress(), 40.0);
}

#[test]
fn tick_while_paused_is_noop() {
    let mut f = fixture(&[300.0]);
    f.controller.seek(10.0);
    let state = f.controller.tick(f.clock.at(100.0));
    assert_eq!(state.progress(), 10.0);
    assert!(!state.is_playing());
}

#[test]
fn song_completion_advances_to_next_song() {
    let mut f = fixture(&[180.0, 200.0]);
    f.controller.play();

    let state = f.controller.tick(f.clock.at(180.0));
    assert_eq!(state.current_index(), 1);
    assert_eq!(state.progress(), 0.0);
    assert!(state.is_playing());
    assert_eq!(state.anchor().unwrap().started_at, f.clock.at(180.0));

    assert_eq!(
        events(&f.history),
        vec![
            (PlaybackEventKind::Start, 1),
            (PlaybackEventKind::End, 1),
            (PlaybackEventKind::Start, 2),
        ]
    );
}

#[test]
fn completion_of_last_song_stops_in_place() {
    let mut f = fixture(&[10.0]);
    f.controller.play();
    f.controller.tick(f.clock.at(9.5));

    let state = f.controller.tick(f.clock.at(10.0));
    assert!(!state.is_playing());
    assert!(state.anchor().is_none());
    assert_eq!(state.current_index(), 0);
    assert_eq!(state.progress(), 9.5);

    assert_eq!(
        events(&f.history),
        vec![(PlaybackEventKind::Start, 1), (PlaybackEventKind::End, 1)]
    );
}

#[test]
fn replaying_finished_song_restarts_it() {
    let mut f = fixture(&[10.0]);
    f.controller.play();
    f.controller.tick(f.clock.at(9.9));
    f.controller.tick(f.clock.at(10.0));

    f.clock.set(std::time::Duration::from_secs(11));
    let state = f.controller.play();
    assert_eq!(state.progress(), 0.0);
    assert_eq!(state.anchor().unwrap().progress_at_start, 0.0);

    let state = f.controller.tick(f.clock.at(11.1));
    assert!(state.is_playing());
    assert!((state.progress() - 0.1).abs() < 1e-6);

    assert_eq!(
        events(&f.history),
        vec![
            (PlaybackEventKind::Start, 1),
            (PlaybackEventKind::End, 1),
            (PlaybackEventKind::Start, 1),
        ]
    );
    assert_eq!(f.history.play_count(SongId(1)), 1);
}

#[test]
fn skip_next_after_queue_end_reports_nothing() {
    let mut f = fixture(&[10.0]);
    f.controller.play();
    f.controller.tick(f.clock.at(9.9));
    f.controller.tick(f.clock.at(10.0));

    f.controller.skip_next();
    let state = f.controller.skip_next();
    assert!(!state.is_playing());
    assert_eq!(state.current_index(), 0);

    assert_eq!(
        events(&f.history),
        vec![(PlaybackEventKind::Start, 1), (PlaybackEventKind::End, 1)]
    );
    assert_eq!(f.history.play_count(SongId(1)), 1);
}

#[test]
fn malformed_song_duration_keeps_progress_in_bounds() {
    let mut song = Song::new(1, "Glitch", "Nobody", 10.0);
    song.duration = -4.0;
    let mut f = fixture_with(QueueSource::new(vec![song]), PlaybackConfig::default());

    let state = f.controller.seek(3.0);
    assert_eq!(state.duration(), 0.0);
    assert_eq!(state.progress(), 0.0);
}

#[test]
fn zero_length_song_finishes_on_first_tick() {
    let mut f = fixture(&[0.0, 30.0]);
    f.controller.play();
    let state = f.controller.tick(f.clock.now());
    assert_eq!(state.current_index(), 1);
}

// ===== Skip Next =====

#[test]
fn skip_next_linear() {
    let mut f = fixture(&[100.0, 100.0, 100.0]);
    f.controller.seek(40.0);

    let state = f.controller.skip_next();
    assert_eq!(state.current_index(), 1);
    assert_eq!(state.progress(), 0.0);
    assert!(state.is_playing());
    assert_eq!(state.anchor().unwrap().progress_at_start, 0.0);

    assert_eq!(
        events(&f.history),
        vec![(PlaybackEventKind::Skip, 1), (PlaybackEventKind::Start, 2)]
    );
}

#[test]
fn skip_next_on_last_song_stops_without_wrapping() {
    let mut f = fixture(&[100.0, 100.0]);
    f.controller.skip_next();
    f.clock.advance_secs(12.0);
    f.controller.tick(f.clock.now());

    let state = f.controller.skip_next();
    assert!(!state.is_playing());
    assert!(state.anchor().is_none());
    assert_eq!(state.current_index(), 1);
    assert_eq!(state.progress(), 12.0);
}

#[test]
fn skip_next_shuffled_follows_order_and_stops_at_end() {
    let mut f = fixture(&[100.0, 100.0, 100.0, 100.0]);
    f.controller.skip_next(); // now at index 1
    f.controller.toggle_shuffle();

    let order = f.controller.state().shuffle_order().unwrap().to_vec();
    assert_eq!(order[0], 1);

    for position in 1..order.len() {
        let state = f.controller.skip_next();
        assert_eq!(state.shuffle_position(), Some(position));
        assert_eq!(state.current_index(), order[position]);
        assert!(state.is_playing());
    }

    let state = f.controller.skip_next();
    assert!(!state.is_playing());
    assert_eq!(state.shuffle_position(), Some(order.len() - 1));
    assert_eq!(state.current_index(), order[order.len() - 1]);
}

// ===== Skip Back =====

#[test]
fn skip_back_early_on_first_song_restarts() {
    let mut f = fixture(&[100.0, 100.0]);
    f.controller.seek(3.0);

    let state = f.controller.skip_back();
    assert_eq!(state.progress(), 0.0);
    assert_eq!(state.current_index(), 0);
    assert!(!state.is_playing());
    assert!(state.anchor().is_none());
}

#[test]
fn skip_back_late_restarts_same_song() {
    for shuffled in [false, true] {
        let mut f = fixture(&[100.0, 100.0, 100.0]);
        f.controller.skip_next();
        if shuffled {
            f.controller.toggle_shuffle();
        }
        f.controller.seek(10.0);

        let state = f.controller.skip_back();
        assert_eq!(state.progress(), 0.0);
        assert_eq!(state.current_index(), 1);
        assert!(state.is_playing());
        assert_eq!(state.anchor().unwrap().started_at, f.clock.now());
        assert_eq!(state.anchor().unwrap().progress_at_start, 0.0);
    }
}

#[test]
fn skip_back_uses_live_progress_while_playing() {
    let mut f = fixture(&[100.0, 100.0]);
    f.controller.skip_next();
    // No tick yet, but 6s have passed since the anchor
    f.clock.advance_secs(6.0);

    let state = f.controller.skip_back();
    assert_eq!(state.current_index(), 1);
    assert_eq!(state.progress(), 0.0);
}

#[test]
fn skip_back_at_threshold_goes_to_previous() {
    let mut f = fixture(&[100.0, 100.0]);
    f.controller.skip_next();
    f.controller.pause();
    f.controller.seek(5.0);

    let state = f.controller.skip_back();
    assert_eq!(state.current_index(), 0);
    assert_eq!(state.progress(), 0.0);
    assert!(state.is_playing());
    assert_eq!(
        events(&f.history).last(),
        Some(&(PlaybackEventKind::Start, 1))
    );
}

#[test]
fn skip_back_shuffled_walks_order_backwards() {
    let mut f = fixture(&[100.0, 100.0, 100.0, 100.0, 100.0]);
    f.controller.toggle_shuffle();
    let order = f.controller.state().shuffle_order().unwrap().to_vec();

    f.controller.skip_next();
    f.controller.skip_next();
    assert_eq!(f.controller.state().current_index(), order[2]);

    let state = f.controller.skip_back();
    assert_eq!(state.shuffle_position(), Some(1));
    assert_eq!(state.current_index(), order[1]);

    f.controller.skip_back();
    let state = f.controller.skip_back();
    assert_eq!(state.shuffle_position(), Some(0));
    assert_eq!(state.current_index(), order[0]);
    assert_eq!(state.progress(), 0.0);
}

#[test]
fn restart_threshold_is_configurable() {
    let config = PlaybackConfig {
        restart_threshold_secs: 2.0,
        ..Default::default()
    };
    let mut f = fixture_with(QueueSource::new(songs(&[100.0, 100.0])), config);
    f.controller.skip_next();
    f.controller.pause();
    f.controller.seek(3.0);

    assert_eq!(f.controller.skip_back().current_index(), 1);
}

// ===== Shuffle =====

#[test]
fn toggle_shuffle_keeps_song_and_progress() {
    let mut f = fixture(&[100.0, 100.0, 100.0]);
    f.controller.skip_next();
    f.controller.seek(33.0);

    let state = f.controller.toggle_shuffle();
    assert!(state.is_shuffled());
    assert_eq!(state.current_index(), 1);
    assert_eq!(state.progress(), 33.0);
    assert_eq!(state.shuffle_position(), Some(0));
    assert_eq!(state.shuffle_order().unwrap()[0], 1);

    let state = f.controller.toggle_shuffle();
    assert!(!state.is_shuffled());
    assert!(state.shuffle_order().is_none());
    assert_eq!(state.current_index(), 1);
    assert_eq!(state.progress(), 33.0);
}

#[test]
fn linear_navigation_resumes_from_current_song_after_unshuffle() {
    let mut f = fixture(&[100.0, 100.0, 100.0, 100.0]);
    f.controller.toggle_shuffle();
    f.controller.skip_next();
    let index = f.controller.state().current_index();
    f.controller.toggle_shuffle();

    let state = f.controller.skip_next();
    if index + 1 < 4 {
        assert_eq!(state.current_index(), index + 1);
    } else {
        assert!(!state.is_playing());
    }
}

// ===== Events =====

#[test]
fn resume_mid_song_does_not_report_start() {
    let mut f = fixture(&[100.0]);
    f.controller.play();
    f.clock.advance_secs(4.0);
    f.controller.pause();
    f.controller.play();

    assert_eq!(events(&f.history), vec![(PlaybackEventKind::Start, 1)]);
}

#[test]
fn failing_sink_does_not_affect_playback() {
    let clock = ManualClock::new();
    let sink = Arc::new(FailingSink::default());
    let mut controller = PlaybackController::builder(QueueSource::new(songs(&[10.0, 10.0])))
        .clock(clock.clone())
        .sink(sink.clone())
        .build();

    controller.play();
    let state = controller.tick(clock.at(10.0));
    assert_eq!(state.current_index(), 1);
    assert!(state.is_playing());

    let state = controller.skip_next();
    assert!(!state.is_playing());

    // start, end, start, skip
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 4);
}

// ===== Metadata & Display =====

#[test]
fn liked_and_playlist_metadata() {
    let source = QueueSource::new(songs(&[100.0, 100.0]))
        .with_liked([SongId(2)])
        .with_playlists(vec![PlaylistSummary {
            id: 1,
            name: "Favourites".to_string(),
        }]);
    let mut f = fixture_with(source, PlaybackConfig::default());

    assert!(!f.controller.is_current_liked());
    f.controller.skip_next();
    assert!(f.controller.is_current_liked());
    assert!(f.controller.is_liked(SongId(2)));
    assert_eq!(f.controller.playlists().len(), 1);
}

#[test]
fn time_display_tracks_ticks() {
    let mut f = fixture(&[185.0]);
    f.controller.play();
    f.controller.tick(f.clock.at(61.7));

    let display = f.controller.time_display();
    assert_eq!(display.elapsed_label(), "1:01");
    assert_eq!(display.remaining_label(), "-2:04");
}

#[test]
fn current_song_is_exposed() {
    let f = fixture(&[100.0]);
    let song = f.controller.current_song().unwrap();
    assert_eq!(song.name, "Song 1");
    assert_eq!(song.author, "Artist");
}
