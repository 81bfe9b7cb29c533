//! Top-level screen selection.
//!
//! The query string is parsed once into a `View`, and the front end matches
//! on it in a single place.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::form_urlencoded;

/// Every top-level screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Welcome,
    Practice,
    Dashboard,
    Profile,
    Auth,
    ResetPassword,
    /// Printable worksheet builder for teachers.
    Teacher,
    /// Question review for content maintainers.
    AdminReview,
    /// Account management.
    AdminUsers,
}

impl View {
    pub const ALL: [View; 9] = [
        View::Welcome,
        View::Practice,
        View::Dashboard,
        View::Profile,
        View::Auth,
        View::ResetPassword,
        View::Teacher,
        View::AdminReview,
        View::AdminUsers,
    ];

    /// Parse a URL query (with or without the leading `?`).
    ///
    /// Flags are checked in a fixed precedence order; unknown flags are
    /// ignored and an empty query is the welcome screen.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let flag = |name: &str| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

        if let Some(admin) = flag("admin") {
            return if admin == "users" {
                View::AdminUsers
            } else {
                View::AdminReview
            };
        }
        if flag("teacher").is_some() {
            return View::Teacher;
        }
        if flag("reset-password").is_some() {
            return View::ResetPassword;
        }
        if flag("auth").is_some() {
            return View::Auth;
        }
        if flag("profile").is_some() {
            return View::Profile;
        }
        if flag("dashboard").is_some() {
            return View::Dashboard;
        }
        if flag("practice").is_some() {
            return View::Practice;
        }
        View::Welcome
    }

    /// Query string that selects this view.
    #[must_use]
    pub fn to_query(self) -> &'static str {
        match self {
            View::Welcome => "",
            View::Practice => "?practice",
            View::Dashboard => "?dashboard",
            View::Profile => "?profile",
            View::Auth => "?auth",
            View::ResetPassword => "?reset-password",
            View::Teacher => "?teacher",
            View::AdminReview => "?admin",
            View::AdminUsers => "?admin=users",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            View::Welcome => "welcome",
            View::Practice => "practice",
            View::Dashboard => "dashboard",
            View::Profile => "profile",
            View::Auth => "auth",
            View::ResetPassword => "reset-password",
            View::Teacher => "teacher",
            View::AdminReview => "admin",
            View::AdminUsers => "admin-users",
        }
    }

    #[must_use]
    pub fn requires_admin(self) -> bool {
        matches!(self, View::AdminReview | View::AdminUsers)
    }

    #[must_use]
    pub fn requires_sign_in(self) -> bool {
        matches!(self, View::Dashboard | View::Profile)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown view: {0}")]
pub struct UnknownView(pub String);

impl FromStr for View {
    type Err = UnknownView;

    /// Accepts a view name (`dashboard`) or a query (`?dashboard`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('?') {
            return Ok(View::from_query(s));
        }
        View::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownView(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_welcome() {
        assert_eq!(View::from_query(""), View::Welcome);
        assert_eq!(View::from_query("?"), View::Welcome);
        assert_eq!(View::from_query("?utm_source=mail"), View::Welcome);
    }

    #[test]
    fn admin_users_beats_plain_admin() {
        assert_eq!(View::from_query("?admin=users"), View::AdminUsers);
        assert_eq!(View::from_query("?admin"), View::AdminReview);
        assert_eq!(View::from_query("admin=1"), View::AdminReview);
    }

    #[test]
    fn admin_takes_precedence_over_other_flags() {
        assert_eq!(View::from_query("?dashboard&admin"), View::AdminReview);
        assert_eq!(View::from_query("?profile&teacher"), View::Teacher);
    }

    #[test]
    fn every_view_round_trips_through_its_query() {
        for view in View::ALL {
            assert_eq!(View::from_query(view.to_query()), view);
            assert_eq!(view.name().parse::<View>().unwrap(), view);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert_eq!(
            "settings".parse::<View>().unwrap_err().to_string(),
            "unknown view: settings"
        );
        assert_eq!("?teacher".parse::<View>().unwrap(), View::Teacher);
    }

    #[test]
    fn gating_flags() {
        assert!(View::AdminUsers.requires_admin());
        assert!(!View::Practice.requires_admin());
        assert!(View::Dashboard.requires_sign_in());
    }
}
