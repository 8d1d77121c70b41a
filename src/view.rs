//! Page selector for the five screens. Transitions are only ever triggered
//! by user input; the app always starts on the landing page, even when a
//! persisted session is live.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Landing,
    Signup,
    Login,
    Dashboard,
    /// Public gallery of the named user.
    Profile(String),
    Exit,
}

/// Gate pages that need a session. The dashboard without a login falls back
/// to the login page; everything else is public.
pub fn resolve(page: Page, logged_in: bool) -> Page {
    match page {
        Page::Dashboard if !logged_in => Page::Login,
        p => p,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_without_session_falls_back_to_login() {
        assert_eq!(resolve(Page::Dashboard, false), Page::Login);
        assert_eq!(resolve(Page::Dashboard, true), Page::Dashboard);
    }

    #[test]
    fn public_pages_pass_through_regardless_of_session() {
        for logged_in in [false, true] {
            assert_eq!(resolve(Page::Landing, logged_in), Page::Landing);
            assert_eq!(resolve(Page::Signup, logged_in), Page::Signup);
            assert_eq!(
                resolve(Page::Profile("ann".into()), logged_in),
                Page::Profile("ann".into())
            );
            assert_eq!(resolve(Page::Exit, logged_in), Page::Exit);
        }
    }
}
