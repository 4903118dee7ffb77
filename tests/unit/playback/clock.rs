use super::*;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn started(clock: &PlaybackClock) -> PlaybackState {
    let mut state = PlaybackState::default();
    assert_eq!(clock.start(&mut state, Instant::now()), 0);
    state
}

#[test]
fn frame_index_is_floor_of_elapsed_times_fps() {
    let clock = PlaybackClock::new(3, Fps::new(10.0).unwrap(), false);
    let mut state = started(&clock);
    assert_eq!(state.phase(), PlaybackPhase::Playing);

    assert_eq!(clock.advance(&mut state, ms(0), false).draw, None);
    assert_eq!(clock.advance(&mut state, ms(100), false).draw, Some(1));
    assert_eq!(clock.advance(&mut state, ms(250), false).draw, Some(2));
    assert_eq!(state.last_drawn(), Some(2));
}

#[test]
fn same_index_is_not_redrawn() {
    let clock = PlaybackClock::new(3, Fps::new(10.0).unwrap(), false);
    let mut state = started(&clock);
    assert_eq!(clock.advance(&mut state, ms(120), false).draw, Some(1));
    assert_eq!(clock.advance(&mut state, ms(150), false), Tick::default());
    assert_eq!(clock.advance(&mut state, ms(199), false), Tick::default());
}

#[test]
fn non_looping_playback_ends_on_last_frame() {
    let clock = PlaybackClock::new(3, Fps::new(10.0).unwrap(), false);
    let mut state = started(&clock);
    clock.advance(&mut state, ms(250), false);

    let tick = clock.advance(&mut state, ms(350), false);
    assert!(tick.ended);
    assert_eq!(tick.draw, None);
    assert_eq!(state.last_drawn(), Some(2));
    assert_eq!(state.phase(), PlaybackPhase::Ended);
    assert!(!state.is_playing());

    // Ended is terminal: later ticks do nothing and never signal the end twice.
    assert_eq!(clock.advance(&mut state, ms(1000), false), Tick::default());
}

#[test]
fn end_reached_directly_draws_the_last_frame() {
    let clock = PlaybackClock::new(3, Fps::new(10.0).unwrap(), false);
    let mut state = started(&clock);
    let tick = clock.advance(&mut state, ms(900), false);
    assert!(tick.ended);
    assert_eq!(tick.draw, Some(2));
}

#[test]
fn looping_wraps_modulo_frame_count() {
    let clock = PlaybackClock::new(3, Fps::new(10.0).unwrap(), true);
    let mut state = started(&clock);
    clock.advance(&mut state, ms(250), false);

    let tick = clock.advance(&mut state, ms(350), false);
    assert_eq!(tick.draw, Some(0));
    assert!(!tick.ended);
    assert!(!tick.restart_audio);
    assert_eq!(state.phase(), PlaybackPhase::Looping);
    assert!(state.is_playing());

    assert_eq!(clock.advance(&mut state, ms(450), false).draw, Some(1));
    assert_eq!(clock.advance(&mut state, ms(3_050), false).draw, Some(0));
}

#[test]
fn looping_restarts_audio_only_once_it_ended() {
    let clock = PlaybackClock::new(2, Fps::new(10.0).unwrap(), true);
    let mut state = started(&clock);
    assert!(!clock.advance(&mut state, ms(100), true).restart_audio);
    assert!(clock.advance(&mut state, ms(200), true).restart_audio);
    assert!(!clock.advance(&mut state, ms(300), false).restart_audio);
}

#[test]
fn zero_frames_end_immediately() {
    let clock = PlaybackClock::new(0, Fps::default(), true);
    let mut state = PlaybackState::default();
    let tick = clock.advance(&mut state, ms(10), false);
    assert!(tick.ended);
    assert_eq!(tick.draw, None);
    assert_eq!(state.phase(), PlaybackPhase::Ended);
}

#[test]
fn elapsed_is_zero_before_start() {
    let state = PlaybackState::default();
    assert_eq!(state.elapsed(Instant::now()), Duration::ZERO);
    assert_eq!(state.phase(), PlaybackPhase::Idle);
    assert!(state.started_at().is_none());
}

#[tokio::test(start_paused = true)]
async fn ending_drops_the_scheduled_tick() {
    let clock = PlaybackClock::new(1, Fps::new(10.0).unwrap(), false);
    let mut state = started(&clock);
    state.scheduled = Some(FrameTicker::new(60.0).unwrap());
    assert!(state.is_scheduled());

    assert!(clock.advance(&mut state, ms(100), false).ended);
    assert!(!state.is_scheduled());
    assert!(!state.cancel_scheduled());
}
