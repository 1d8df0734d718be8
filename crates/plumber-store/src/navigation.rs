//! Route table and navigation guard.

use std::sync::Arc;

use plumber_core::{Navigator, Observable, Session};
use plumber_transport::LOGIN_PATH;
use tokio::sync::watch;

/// Where a logged-in user lands after visiting the login page.
pub const HOME_PATH: &str = "/agents";

/// Upper bound on chained redirects followed by one navigation.
const MAX_REDIRECTS: usize = 4;

/// A client route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub name: &'static str,
    /// Path pattern; segments starting with `:` match any single segment.
    pub pattern: &'static str,
    pub requires_auth: bool,
    /// Route that always forwards elsewhere.
    pub redirect: Option<&'static str>,
}

impl Route {
    const fn public(name: &'static str, pattern: &'static str) -> Self {
        Self {
            name,
            pattern,
            requires_auth: false,
            redirect: None,
        }
    }

    const fn protected(name: &'static str, pattern: &'static str) -> Self {
        Self {
            name,
            pattern,
            requires_auth: true,
            redirect: None,
        }
    }

    fn matches(&self, path: &str) -> bool {
        let mut want = segments(self.pattern);
        let mut got = segments(path);
        loop {
            match (want.next(), got.next()) {
                (None, None) => return true,
                (Some(w), Some(g)) if w.starts_with(':') || w == g => {}
                _ => return false,
            }
        }
    }
}

pub const ROUTES: &[Route] = &[
    Route::public("Login", LOGIN_PATH),
    Route {
        name: "Home",
        pattern: "/",
        requires_auth: true,
        redirect: Some(HOME_PATH),
    },
    Route::protected("Agents", "/agents"),
    Route::protected("Tasks", "/tasks"),
    Route::protected("CreateTask", "/tasks/create"),
    Route::protected("TaskExecution", "/tasks/:id/execution/:executionId"),
    Route::protected("WebSSH", "/webssh"),
];

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Strip query string and fragment.
fn route_path(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Find the route serving `path`.
#[must_use]
pub fn find_route(path: &str) -> Option<&'static Route> {
    let path = route_path(path);
    ROUTES.iter().find(|r| r.matches(path))
}

/// Outcome of checking a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(&'static str),
}

/// Gates navigation on login state and records the current location.
pub struct NavigationGuard {
    session: Arc<Session>,
    location: Observable<String>,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            location: Observable::new(String::from("/")),
        }
    }

    /// Decide whether `path` may be shown right now.
    ///
    /// Unknown paths proceed; there is nothing to protect.
    #[must_use]
    pub fn check(&self, path: &str) -> Navigation {
        let Some(route) = find_route(path) else {
            return Navigation::Proceed;
        };
        let logged_in = self.session.is_logged_in();

        if route.requires_auth && !logged_in {
            Navigation::Redirect(LOGIN_PATH)
        } else if route.pattern == LOGIN_PATH && logged_in {
            Navigation::Redirect(HOME_PATH)
        } else if let Some(target) = route.redirect {
            Navigation::Redirect(target)
        } else {
            Navigation::Proceed
        }
    }

    /// Current location.
    #[must_use]
    pub fn current(&self) -> String {
        self.location.get()
    }

    /// Watch the location for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.location.subscribe()
    }
}

impl Navigator for NavigationGuard {
    fn navigate(&self, path: &str) {
        let mut target = path.to_string();
        for _ in 0..MAX_REDIRECTS {
            match self.check(&target) {
                Navigation::Proceed => break,
                Navigation::Redirect(next) if next == route_path(&target) => break,
                Navigation::Redirect(next) => {
                    tracing::debug!(from = %target, to = next, "Redirecting");
                    target = next.to_string();
                }
            }
        }
        self.location.set(target);
    }
}
