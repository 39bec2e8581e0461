//! Client route table and access guard

use crate::models::UserSummary;
use crate::types::Role;

/// Static information pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoPage {
    JoinAsInstructor,
    GovernmentInfo,
    Vouchers,
    Safety,
    Reviews,
    About,
    Faqs,
}

impl InfoPage {
    const ALL: [InfoPage; 7] = [
        InfoPage::JoinAsInstructor,
        InfoPage::GovernmentInfo,
        InfoPage::Vouchers,
        InfoPage::Safety,
        InfoPage::Reviews,
        InfoPage::About,
        InfoPage::Faqs,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            InfoPage::JoinAsInstructor => "/instructors",
            InfoPage::GovernmentInfo => "/gov-info",
            InfoPage::Vouchers => "/vouchers",
            InfoPage::Safety => "/safety",
            InfoPage::Reviews => "/reviews",
            InfoPage::About => "/about",
            InfoPage::Faqs => "/faqs",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            InfoPage::JoinAsInstructor => "Join as Instructor",
            InfoPage::GovernmentInfo => "Government Info",
            InfoPage::Vouchers => "Gift Vouchers",
            InfoPage::Safety => "Safety Information",
            InfoPage::Reviews => "Reviews",
            InfoPage::About => "About Us",
            InfoPage::Faqs => "FAQs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Search,
    Instructor(String),
    Pricing,
    BookingConfirm,
    Payment,
    Dashboard,
    Admin,
    Compare,
    TestCentres,
    Learners,
    Info(InfoPage),
}

/// Who may open a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    SignedIn,
    Role(Role),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Allow,
    Redirect(Route),
}

impl Route {
    /// Resolve a path. `/booking` lands on search; unknown paths give None.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let route = match trimmed {
            "" => Route::Home,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/search" | "/booking" => Route::Search,
            "/pricing" => Route::Pricing,
            "/booking-confirm" => Route::BookingConfirm,
            "/payment" => Route::Payment,
            "/dashboard" => Route::Dashboard,
            "/admin" => Route::Admin,
            "/compare" => Route::Compare,
            "/test-centres" => Route::TestCentres,
            "/learners" => Route::Learners,
            other => {
                if let Some(id) = other.strip_prefix("/instructor/") {
                    if id.is_empty() || id.contains('/') {
                        return None;
                    }
                    Route::Instructor(id.to_string())
                } else {
                    Route::Info(InfoPage::ALL.into_iter().find(|p| p.path() == other)?)
                }
            }
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::Login => "/login".into(),
            Route::Register => "/register".into(),
            Route::Search => "/search".into(),
            Route::Instructor(id) => format!("/instructor/{}", id),
            Route::Pricing => "/pricing".into(),
            Route::BookingConfirm => "/booking-confirm".into(),
            Route::Payment => "/payment".into(),
            Route::Dashboard => "/dashboard".into(),
            Route::Admin => "/admin".into(),
            Route::Compare => "/compare".into(),
            Route::TestCentres => "/test-centres".into(),
            Route::Learners => "/learners".into(),
            Route::Info(page) => page.path().into(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::BookingConfirm | Route::Payment | Route::Dashboard => Access::SignedIn,
            Route::Admin => Access::Role(Role::Admin),
            _ => Access::Public,
        }
    }

    /// Signed-out users go to login; signed-in users without the required
    /// role go to their dashboard.
    pub fn guard(&self, user: Option<&UserSummary>) -> Guard {
        match (self.access(), user) {
            (Access::Public, _) => Guard::Allow,
            (_, None) => Guard::Redirect(Route::Login),
            (Access::SignedIn, Some(_)) => Guard::Allow,
            (Access::Role(role), Some(user)) if user.role == role => Guard::Allow,
            (Access::Role(_), Some(_)) => Guard::Redirect(Route::Dashboard),
        }
    }
}
