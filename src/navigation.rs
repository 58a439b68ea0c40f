//! Views, their access metadata, and the guard evaluated before each
//! transition. The guard is UX only; the API enforces real access control.

use crate::session::Session;
use std::{
    fmt,
    sync::{Mutex, PoisonError},
};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Login,
    Dashboard,
    Profile,
    VerifyEmail,
    ResetPassword,
    Setup2fa,
    DeleteAccount,
    AccountDeleted,
    AdminSignup,
    NotFound,
}

/// Access requirements attached to a view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
    pub guest_only: bool,
}

impl View {
    pub const ALL: [Self; 11] = [
        Self::Home,
        Self::Login,
        Self::Dashboard,
        Self::Profile,
        Self::VerifyEmail,
        Self::ResetPassword,
        Self::Setup2fa,
        Self::DeleteAccount,
        Self::AccountDeleted,
        Self::AdminSignup,
        Self::NotFound,
    ];

    /// Landing view for authenticated users.
    pub const LANDING: Self = Self::Dashboard;

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::Profile => "/profile",
            Self::VerifyEmail => "/verify-email",
            Self::ResetPassword => "/reset-password",
            Self::Setup2fa => "/setup-2fa",
            Self::DeleteAccount => "/delete-account",
            Self::AccountDeleted => "/account-deleted",
            Self::AdminSignup => "/admin-signup",
            Self::NotFound => "/404",
        }
    }

    /// Resolves a path, ignoring query string, fragment and trailing slash.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };

        Self::ALL
            .into_iter()
            .filter(|view| *view != Self::NotFound)
            .find(|view| view.path() == normalized)
            .unwrap_or(Self::NotFound)
    }

    #[must_use]
    pub fn meta(self) -> RouteMeta {
        match self {
            Self::Dashboard | Self::Profile | Self::Setup2fa | Self::DeleteAccount => RouteMeta {
                requires_auth: true,
                ..RouteMeta::default()
            },
            Self::AdminSignup => RouteMeta {
                requires_auth: true,
                requires_admin: true,
                guest_only: false,
            },
            Self::Login => RouteMeta {
                guest_only: true,
                ..RouteMeta::default()
            },
            Self::Home
            | Self::VerifyEmail
            | Self::ResetPassword
            | Self::AccountDeleted
            | Self::NotFound => RouteMeta::default(),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(View),
}

/// Decides whether a transition into a view with `meta` may proceed.
#[must_use]
pub fn guard(meta: RouteMeta, session: &Session) -> GuardDecision {
    if meta.requires_auth && !session.is_authenticated() {
        return GuardDecision::Redirect(View::Login);
    }

    if meta.requires_admin && !session.is_admin() {
        return GuardDecision::Redirect(View::LANDING);
    }

    if meta.guest_only && session.is_authenticated() {
        return GuardDecision::Redirect(View::LANDING);
    }

    GuardDecision::Allow
}

/// Navigation handle injected into the store and the transport.
pub trait Navigator: Send + Sync {
    fn navigate(&self, view: View);
}

/// Tracks the current view and logs every transition.
#[derive(Debug)]
pub struct TracingNavigator {
    current: Mutex<View>,
}

impl TracingNavigator {
    #[must_use]
    pub fn new(initial: View) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    #[must_use]
    pub fn current(&self) -> View {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TracingNavigator {
    fn default() -> Self {
        Self::new(View::Home)
    }
}

impl Navigator for TracingNavigator {
    fn navigate(&self, view: View) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *current;
        info!(from = %previous, to = %view, "navigate");
        *current = view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::User;
    use secrecy::SecretString;
    use serde_json::json;

    fn anonymous() -> Session {
        Session::default()
    }

    fn signed_in(is_staff: bool) -> Session {
        Session {
            access_token: Some(SecretString::from("A1".to_string())),
            refresh_token: Some(SecretString::from("R1".to_string())),
            user: User::from_value(json!({"id": 1, "is_staff": is_staff})),
        }
    }

    #[test]
    fn protected_view_redirects_anonymous_to_login() {
        assert_eq!(
            guard(View::Dashboard.meta(), &anonymous()),
            GuardDecision::Redirect(View::Login)
        );
        assert_eq!(
            guard(View::AdminSignup.meta(), &anonymous()),
            GuardDecision::Redirect(View::Login)
        );
    }

    #[test]
    fn admin_view_requires_staff() {
        assert_eq!(
            guard(View::AdminSignup.meta(), &signed_in(false)),
            GuardDecision::Redirect(View::Dashboard)
        );
        assert_eq!(
            guard(View::AdminSignup.meta(), &signed_in(true)),
            GuardDecision::Allow
        );
    }

    #[test]
    fn admin_view_without_profile_redirects() {
        let mut session = signed_in(true);
        session.user = None;
        assert_eq!(
            guard(View::AdminSignup.meta(), &session),
            GuardDecision::Redirect(View::Dashboard)
        );
    }

    #[test]
    fn guest_only_view_redirects_authenticated() {
        assert_eq!(
            guard(View::Login.meta(), &signed_in(false)),
            GuardDecision::Redirect(View::Dashboard)
        );
        assert_eq!(guard(View::Login.meta(), &anonymous()), GuardDecision::Allow);
    }

    #[test]
    fn public_views_always_allowed() {
        for view in [View::Home, View::VerifyEmail, View::ResetPassword, View::NotFound] {
            assert_eq!(guard(view.meta(), &anonymous()), GuardDecision::Allow);
            assert_eq!(guard(view.meta(), &signed_in(false)), GuardDecision::Allow);
        }
    }

    #[test]
    fn from_path_normalizes() {
        assert_eq!(View::from_path("/"), View::Home);
        assert_eq!(View::from_path(""), View::Home);
        assert_eq!(View::from_path("/login/"), View::Login);
        assert_eq!(View::from_path("/verify-email?token=abc"), View::VerifyEmail);
        assert_eq!(View::from_path("/admin-signup#top"), View::AdminSignup);
        assert_eq!(View::from_path("/nowhere"), View::NotFound);
        for view in View::ALL.into_iter().filter(|v| *v != View::NotFound) {
            assert_eq!(View::from_path(view.path()), view);
        }
    }

    #[test]
    fn tracing_navigator_tracks_current_view() {
        let navigator = TracingNavigator::default();
        assert_eq!(navigator.current(), View::Home);
        navigator.navigate(View::Login);
        assert_eq!(navigator.current(), View::Login);
    }
}
