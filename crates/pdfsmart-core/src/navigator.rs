//! Bounds-checked page navigation.
//!
//! Navigation never saves. Unsaved annotations on the page being left stay in
//! the scene and history only; nothing is queued for the backend.

use crate::session::SessionState;

/// Page index transitions, gated on an active session.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageNavigator;

impl PageNavigator {
    /// Move to the previous page. No-op on the first page.
    pub fn previous(session: &mut SessionState) -> bool {
        let current = session.current_page();
        if current == 0 {
            return false;
        }
        Self::go_to(session, current - 1)
    }

    /// Move to the next page. No-op on the last page.
    pub fn next(session: &mut SessionState) -> bool {
        let next = session.current_page() + 1;
        Self::go_to(session, next)
    }

    /// Jump to `index`. Out-of-range requests are ignored.
    pub fn go_to(session: &mut SessionState, index: usize) -> bool {
        if !session.has_session() {
            return false;
        }
        if index >= session.page_count() || index == session.current_page() {
            return false;
        }
        log::debug!("Page {} -> {}", session.current_page(), index);
        session.set_current_page(index);
        true
    }

    pub fn is_first(session: &SessionState) -> bool {
        session.current_page() == 0
    }

    pub fn is_last(session: &SessionState) -> bool {
        session.current_page() + 1 >= session.page_count()
    }

    /// One-based "Page X of Y" label.
    pub fn label(session: &SessionState) -> String {
        let page_count = session.page_count();
        format!(
            "Page {} of {}",
            (session.current_page() + 1).min(page_count),
            page_count
        )
    }
}
