use crate::common::fake_host::HostCall;
use crate::common::fake_modal::ModalCall;
use crate::common::fixtures::{numbered_lines, MAIN_DOC, MAIN_VIEW};
use crate::common::harness::SyncTestHarness;
use modal_sync::model::event::{HostEvent, ScrollCommand};
use modal_sync::model::position::{CursorPosition, ModalPosition, SelectionRange, VisibleRange};

/// 200 lines, view showing 80..100, cursor on line 90 column 3
async fn scrolled_harness() -> SyncTestHarness {
    let mut harness = SyncTestHarness::new();
    harness
        .open_focused(MAIN_VIEW, MAIN_DOC, numbered_lines(200))
        .await;
    harness.wheel_scroll(MAIN_VIEW, 80).await;
    harness.click(MAIN_VIEW, 90, 3).await;
    harness.host.clear_calls();
    harness.modal.clear_calls();
    harness
}

#[tokio::test]
async fn test_cursor_to_top() {
    let mut harness = scrolled_harness().await;
    let window = harness.window(MAIN_VIEW);

    harness
        .scroll_command(MAIN_VIEW, ScrollCommand::CursorToTop)
        .await;

    assert_eq!(
        harness.host.visible_range_of(MAIN_VIEW),
        Some(VisibleRange::new(90, 110))
    );
    assert_eq!(harness.host_winline(MAIN_VIEW), Some(1));
    assert_eq!(harness.modal.cursor_of(window), Some(ModalPosition::new(91, 3)));
    // Cursor-relative commands need no read-back once the range is known
    assert!(!harness
        .host
        .calls()
        .iter()
        .any(|c| matches!(c, HostCall::QueryVisibleRange { .. })));
    harness.assert_settled();
}

#[tokio::test]
async fn test_cursor_to_bottom() {
    let mut harness = scrolled_harness().await;

    harness
        .scroll_command(MAIN_VIEW, ScrollCommand::CursorToBottom)
        .await;

    assert_eq!(
        harness.host.visible_range_of(MAIN_VIEW),
        Some(VisibleRange::new(71, 91))
    );
    assert_eq!(harness.host_winline(MAIN_VIEW), Some(20));
}

/// `ctrl-f` reads back what the host shows and leaves the cursor on the
/// first row of the next page
#[tokio::test]
async fn test_page_forward_lands_on_first_row() {
    let mut harness = scrolled_harness().await;
    let window = harness.window(MAIN_VIEW);

    harness
        .scroll_command(MAIN_VIEW, ScrollCommand::PageForward { count: 1 })
        .await;

    assert!(matches!(
        harness.host.calls().first(),
        Some(HostCall::QueryVisibleRange { .. })
    ));
    assert_eq!(
        harness.host.visible_range_of(MAIN_VIEW),
        Some(VisibleRange::new(98, 118))
    );
    assert_eq!(harness.host_winline(MAIN_VIEW), Some(1));
    assert_eq!(harness.modal.cursor_of(window), Some(ModalPosition::new(99, 3)));
    harness.assert_settled();
}

/// The range read back wins over a stale notification
#[tokio::test]
async fn test_page_forward_uses_actual_visible_range() {
    let mut harness = scrolled_harness().await;

    // The host scrolled without telling anyone yet
    harness
        .host
        .user_scroll(MAIN_VIEW, VisibleRange::new(85, 105));
    harness
        .scroll_command(MAIN_VIEW, ScrollCommand::PageForward { count: 1 })
        .await;

    assert_eq!(
        harness.host.visible_range_of(MAIN_VIEW),
        Some(VisibleRange::new(103, 123))
    );
    assert_eq!(harness.host_winline(MAIN_VIEW), Some(1));
}

#[tokio::test]
async fn test_screen_relative_motions_do_not_scroll() {
    let mut harness = scrolled_harness().await;
    let expected = [
        (ScrollCommand::ScreenTop { count: 1 }, 80),
        (ScrollCommand::ScreenMiddle, 89),
        (ScrollCommand::ScreenBottom { count: 1 }, 99),
        (ScrollCommand::ScreenTop { count: 5 }, 84),
    ];

    for (command, line) in expected {
        harness.scroll_command(MAIN_VIEW, command).await;
        assert_eq!(
            harness.host_cursor(MAIN_VIEW),
            Some(CursorPosition::new(line, 3)),
            "{command:?}"
        );
        assert_eq!(
            harness.host.visible_range_of(MAIN_VIEW),
            Some(VisibleRange::new(80, 100)),
            "{command:?} scrolled the view"
        );
        harness.assert_settled();
    }
}

/// Wheel scrolling the cursor off screen pulls it along without a host
/// scroll correction
#[tokio::test]
async fn test_wheel_scroll_pulls_cursor_into_view() {
    let mut harness = scrolled_harness().await;
    let window = harness.window(MAIN_VIEW);

    harness.wheel_scroll(MAIN_VIEW, 120).await;

    assert!(harness.modal.calls().contains(&ModalCall::SetTopline {
        window,
        topline: 121
    }));
    assert_eq!(harness.modal.cursor_of(window), Some(ModalPosition::new(121, 3)));
    assert_eq!(harness.host_cursor(MAIN_VIEW), Some(CursorPosition::new(120, 3)));
    assert_eq!(
        harness.host.visible_range_of(MAIN_VIEW),
        Some(VisibleRange::new(120, 140))
    );
    assert!(!harness
        .host
        .calls()
        .iter()
        .any(|c| matches!(c, HostCall::RevealRange { .. })));
    harness.assert_settled();
}

/// Pulling the cursor along with a wheel scroll keeps the user's selection
#[tokio::test]
async fn test_wheel_scroll_keeps_selection_anchor() {
    let mut harness = scrolled_harness().await;
    let window = harness.window(MAIN_VIEW);
    let selection = SelectionRange::new(CursorPosition::new(85, 0), CursorPosition::new(90, 3));
    harness.host.user_select(MAIN_VIEW, selection);
    harness
        .host_event(HostEvent::SelectionChanged {
            view: MAIN_VIEW,
            selection,
            generation: None,
        })
        .await;

    harness.wheel_scroll(MAIN_VIEW, 120).await;

    assert_eq!(
        harness.host.selection_of(MAIN_VIEW),
        Some(SelectionRange::new(
            CursorPosition::new(85, 0),
            CursorPosition::new(120, 3)
        ))
    );
    assert_eq!(harness.modal.cursor_of(window), Some(ModalPosition::new(121, 3)));
    harness.assert_settled();
}

/// An inverted range read back from the host counts as a one-line view
#[tokio::test]
async fn test_inverted_visible_range_read_back() {
    let mut harness = scrolled_harness().await;
    let window = harness.window(MAIN_VIEW);

    harness.host.user_scroll(
        MAIN_VIEW,
        VisibleRange {
            top_line: 95,
            bottom_line: 85,
        },
    );
    harness
        .scroll_command(MAIN_VIEW, ScrollCommand::ScreenMiddle)
        .await;

    assert_eq!(harness.host_cursor(MAIN_VIEW), Some(CursorPosition::new(95, 3)));
    assert_eq!(harness.modal.cursor_of(window), Some(ModalPosition::new(96, 3)));
    harness.assert_settled();
}

#[tokio::test]
async fn test_modal_scroll_is_mirrored_with_tolerance() {
    let mut harness = scrolled_harness().await;
    let window = harness.window(MAIN_VIEW);

    harness.modal.user_scroll(window, 151);
    harness.settle().await;
    assert_eq!(
        harness.host.visible_range_of(MAIN_VIEW),
        Some(VisibleRange::new(150, 170))
    );

    // One row of drift is soft-wrap noise
    harness.host.clear_calls();
    harness.modal.user_scroll(window, 152);
    harness.settle().await;
    assert!(harness.host.calls().is_empty());
    assert_eq!(
        harness.host.visible_range_of(MAIN_VIEW),
        Some(VisibleRange::new(150, 170))
    );
    harness.assert_settled();
}
