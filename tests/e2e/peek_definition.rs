use crate::common::fake_modal::ModalCall;
use crate::common::fixtures::{
    main_ts, peek_definition_events, usage_position, MAIN_DOC, MAIN_VIEW, PEEK_VIEW,
};
use crate::common::harness::SyncTestHarness;
use modal_sync::model::errors::{SyncError, Unresolved};
use modal_sync::model::event::{HostEvent, ViewKind};
use modal_sync::model::position::{CursorPosition, ModalPosition};

async fn harness_at_usage() -> SyncTestHarness {
    let mut harness = SyncTestHarness::new();
    harness.open_focused(MAIN_VIEW, MAIN_DOC, main_ts()).await;
    let usage = usage_position();
    harness.click(MAIN_VIEW, usage.line, usage.column).await;
    harness
        .host
        .script("peek_definition", peek_definition_events());
    harness.host.clear_calls();
    harness.modal.clear_calls();
    harness
}

/// Opening and closing a peek never touches the modal engine
#[tokio::test]
async fn test_peek_leaves_modal_cursor_alone() {
    let mut harness = harness_at_usage().await;
    let main_window = harness.window(MAIN_VIEW);

    harness.run_host_command("peek_definition").await;
    assert!(harness.view_state(PEEK_VIEW).is_provisional());
    harness.click(PEEK_VIEW, 1, 4).await;
    harness
        .host_event(HostEvent::EditorHidden { view: PEEK_VIEW })
        .await;

    assert!(harness.modal.calls().is_empty());
    assert_eq!(harness.modal.cursor_of(main_window), Some(ModalPosition::new(3, 1)));
    assert_eq!(harness.host_cursor(MAIN_VIEW), Some(usage_position()));
    assert_eq!(harness.reconciler().active_view(), Some(MAIN_VIEW));
    assert!(harness.reconciler().view_state(PEEK_VIEW).is_none());
    harness.assert_settled();
}

/// Engine notifications for a window only a peek shows have no view to go to
#[tokio::test]
async fn test_peek_window_is_not_a_cursor_target() {
    let mut harness = harness_at_usage().await;

    harness.run_host_command("peek_definition").await;
    let peek_window = harness.window(PEEK_VIEW);
    assert_eq!(
        harness.reconciler().registry().resolve_reverse(peek_window),
        None
    );

    harness.modal.user_motion(peek_window, ModalPosition::new(2, 0));
    harness.settle().await;

    assert!(harness.host.selections(PEEK_VIEW).is_empty());
    assert!(harness.reconciler().diagnostics().iter().any(|d| d.error
        == SyncError::ResolutionFailure(Unresolved::Window(peek_window))));
}

/// Typing into a peek makes it a real editor
#[tokio::test]
async fn test_keystroke_promotes_peek() {
    let mut harness = harness_at_usage().await;

    harness.run_host_command("peek_definition").await;
    harness.focus(PEEK_VIEW).await;
    assert!(harness.modal.calls().is_empty());

    harness
        .host_event(HostEvent::KeyInput { view: PEEK_VIEW })
        .await;

    let window = harness.window(PEEK_VIEW);
    assert!(harness.view_state(PEEK_VIEW).is_durable());
    assert_eq!(
        harness.modal.calls(),
        vec![
            ModalCall::ActivateWindow { window },
            ModalCall::SetCursor {
                window,
                position: ModalPosition::new(1, 17)
            },
        ]
    );
    assert_eq!(
        harness.reconciler().registry().resolve_reverse(window),
        Some(PEEK_VIEW)
    );
}

/// An unmarked view that stays open past the grace interval settles as a
/// real editor
#[tokio::test]
async fn test_unclassified_view_settles_after_grace() {
    let mut harness = harness_at_usage().await;

    harness.run_host_command("peek_definition").await;
    harness.focus(PEEK_VIEW).await;
    harness.advance(100).await;
    assert!(harness.modal.calls().is_empty());

    let grace = harness.reconciler().config().transient_grace_ms;
    harness.advance(grace + 100).await;

    let window = harness.window(PEEK_VIEW);
    assert_eq!(harness.modal.current_window(), Some(window));
    assert_eq!(harness.modal.cursor_of(window), Some(ModalPosition::new(1, 17)));
}

/// A peek into the file being edited shares its window without taking it over
#[tokio::test]
async fn test_peek_of_same_document_does_not_steal_window() {
    let mut harness = harness_at_usage().await;
    let main_window = harness.window(MAIN_VIEW);

    harness
        .show_view(PEEK_VIEW, MAIN_DOC, Some(ViewKind::Transient))
        .await;
    assert_eq!(harness.window(PEEK_VIEW), main_window);
    harness.click(PEEK_VIEW, 0, 9).await;
    assert!(harness.modal.calls().is_empty());

    harness.modal.user_motion(main_window, ModalPosition::new(4, 0));
    harness.settle().await;

    assert_eq!(
        harness.host_cursor(MAIN_VIEW),
        Some(CursorPosition::new(3, 0))
    );
    assert_eq!(
        harness.host_cursor(PEEK_VIEW),
        Some(CursorPosition::new(0, 9))
    );
    assert!(harness.host.selections(PEEK_VIEW).is_empty());
}

/// An unclassified pane of the edited file settling in the background leaves
/// the focused pane in charge of the window
#[tokio::test]
async fn test_background_pane_settling_keeps_focused_owner() {
    let mut harness = harness_at_usage().await;
    let main_window = harness.window(MAIN_VIEW);

    harness.show_view(PEEK_VIEW, MAIN_DOC, None).await;
    let grace = harness.reconciler().config().transient_grace_ms;
    harness.advance(grace + 100).await;

    assert!(harness.view_state(PEEK_VIEW).is_durable());
    assert_eq!(harness.reconciler().active_view(), Some(MAIN_VIEW));
    assert_eq!(
        harness.reconciler().registry().resolve_reverse(main_window),
        Some(MAIN_VIEW)
    );

    harness.modal.user_motion(main_window, ModalPosition::new(4, 0));
    harness.settle().await;

    assert_eq!(
        harness.host_cursor(MAIN_VIEW),
        Some(CursorPosition::new(3, 0))
    );
    assert!(harness.host.selections(PEEK_VIEW).is_empty());
}
