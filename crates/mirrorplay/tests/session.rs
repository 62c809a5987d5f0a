//! Playback sessions driven by the tokio runtime with paused time.

mod common;

use std::time::Duration;

use common::{cdn_a, init_tracing, mirrored, no_video, primary_only, region_cdn};
use mirrorplay_engine::{
    Error, FailoverConfig, FailoverEvent, FailureCause, PlaybackSession, Phase, PlayerView,
    RegionHint, SessionHandle, Slot,
};
use tokio::sync::watch;

fn spawn(content: mirrorplay_engine::Content, hint: RegionHint) -> SessionHandle {
    init_tracing();
    PlaybackSession::spawn(content, hint, FailoverConfig::default())
}

async fn wait_for(
    view: &mut watch::Receiver<PlayerView>,
    predicate: impl FnMut(&PlayerView) -> bool,
) -> PlayerView {
    tokio::time::timeout(Duration::from_secs(120), view.wait_for(predicate))
        .await
        .expect("view did not reach the expected state")
        .expect("session dropped its view")
        .clone()
}

#[tokio::test(start_paused = true)]
async fn test_initial_view_is_available_immediately() {
    let session = spawn(mirrored(), RegionHint::Restricted);
    let view = session.view();

    assert_eq!(view.phase, Phase::Loading);
    assert_eq!(view.active_slot, Some(Slot::Secondary));
    assert_eq!(view.current_source, Some(region_cdn("r1")));
    assert!(view.can_toggle_manually);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fails_over_and_success_settles() {
    let session = spawn(mirrored(), RegionHint::Unknown);
    let mut view = session.watch();
    let mut events = session.subscribe();

    let after_failover = wait_for(&mut view, |v| v.active_slot == Some(Slot::Secondary)).await;
    assert_eq!(after_failover.phase, Phase::Loading);

    let failed = loop {
        match events.recv().await.unwrap() {
            FailoverEvent::LoadFailed { source, cause, .. } => break (source, cause),
            _ => continue,
        }
    };
    assert_eq!(failed, (cdn_a("v1"), FailureCause::Timeout));

    session.load_succeeded().await.unwrap();
    let ready = wait_for(&mut view, |v| v.phase == Phase::Ready).await;
    assert_eq!(ready.current_source, Some(region_cdn("r1")));
}

#[tokio::test(start_paused = true)]
async fn test_both_sources_time_out_then_retry() {
    let session = spawn(mirrored(), RegionHint::Unknown);
    let mut view = session.watch();

    let terminal = wait_for(&mut view, |v| v.phase == Phase::FailedTerminal).await;
    assert!(terminal.can_retry);
    assert!(terminal.can_toggle_manually);

    assert!(session.retry().await.unwrap());
    let restarted = wait_for(&mut view, |v| v.phase == Phase::Loading).await;
    assert_eq!(restarted.active_slot, Some(Slot::Primary));
}

#[tokio::test(start_paused = true)]
async fn test_single_source_error_is_terminal() {
    let session = spawn(primary_only(), RegionHint::Unknown);
    let mut view = session.watch();

    session.load_failed().await.unwrap();
    let terminal = wait_for(&mut view, |v| v.phase == Phase::FailedTerminal).await;
    assert!(!terminal.can_toggle_manually);
    assert!(!session.toggle_source().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_manual_toggle_cancels_pending_timeout() {
    let session = spawn(mirrored(), RegionHint::Unknown);
    let mut view = session.watch();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(session.toggle_source().await.unwrap());
    assert_eq!(session.view().active_slot, Some(Slot::Secondary));

    // The primary window would have closed at 15s; the secondary one runs to 25s.
    tokio::time::sleep(Duration::from_secs(10)).await;
    let view_now = session.view();
    assert_eq!(view_now.phase, Phase::Loading);
    assert_eq!(view_now.active_slot, Some(Slot::Secondary));

    let failed_over = wait_for(&mut view, |v| v.active_slot == Some(Slot::Primary)).await;
    assert_eq!(failed_over.phase, Phase::Loading);
}

#[tokio::test(start_paused = true)]
async fn test_no_source_session_stays_idle() {
    let session = spawn(no_video(), RegionHint::Restricted);
    assert_eq!(session.view().phase, Phase::NoSource);

    assert!(!session.retry().await.unwrap());
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(session.view().phase, Phase::NoSource);
    assert_eq!(session.view().current_source, None);
}

#[tokio::test(start_paused = true)]
async fn test_replace_content_starts_over() {
    let session = spawn(primary_only(), RegionHint::Unknown);
    let mut view = session.watch();
    session.load_failed().await.unwrap();
    wait_for(&mut view, |v| v.phase == Phase::FailedTerminal).await;

    session.replace_content(mirrored()).await.unwrap();
    let fresh = wait_for(&mut view, |v| v.title == "Mirrored lesson").await;
    assert_eq!(fresh.phase, Phase::Loading);
    assert!(fresh.can_toggle_manually);
}

#[tokio::test(start_paused = true)]
async fn test_late_region_hint_used_on_retry() {
    let session = spawn(mirrored(), RegionHint::Unknown);
    let mut view = session.watch();
    session.set_region_hint(RegionHint::Restricted).await.unwrap();
    assert_eq!(session.view().active_slot, Some(Slot::Primary));

    wait_for(&mut view, |v| v.phase == Phase::FailedTerminal).await;
    assert!(session.retry().await.unwrap());
    assert_eq!(session.view().active_slot, Some(Slot::Secondary));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_task() {
    let session = spawn(mirrored(), RegionHint::Unknown);
    let view = session.watch();
    let events = session.subscribe();
    session.shutdown().await;

    // The task is gone; its view sender went with it.
    assert!(view.has_changed().is_err());
    drop(events);
}

#[tokio::test(start_paused = true)]
async fn test_sending_to_cancelled_session_reports_closed() {
    let session = spawn(mirrored(), RegionHint::Unknown);
    let mut view = session.watch();
    session.close();

    // Wait until the task observed cancellation and dropped its receiver.
    let _ = view.changed().await;
    let err = session.load_succeeded().await.unwrap_err();
    assert!(matches!(err, Error::SessionClosed));
    assert!(session.is_closed());
}
