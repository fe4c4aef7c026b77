use crate::models::session::Session;
use crate::models::user::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Auth,
    CustomerDashboard,
    SchedulePickup,
    OrderHistory,
    PartnerDashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSet {
    Loading,
    Auth,
    Customer,
    Partner,
}

impl ScreenSet {
    /// Screens reachable in this set; the first one is the entry point.
    pub fn screens(&self) -> &'static [Screen] {
        match self {
            ScreenSet::Loading => &[Screen::Loading],
            ScreenSet::Auth => &[Screen::Auth],
            ScreenSet::Customer => &[
                Screen::CustomerDashboard,
                Screen::SchedulePickup,
                Screen::OrderHistory,
            ],
            ScreenSet::Partner => &[Screen::PartnerDashboard],
        }
    }

    pub fn entry(&self) -> Screen {
        self.screens()[0]
    }
}

pub fn route(session: &Session) -> ScreenSet {
    match session.role() {
        None => ScreenSet::Auth,
        Some(UserRole::Customer) => ScreenSet::Customer,
        Some(UserRole::Partner) => ScreenSet::Partner,
    }
}

#[cfg(test)]
mod tests {
    use super::{Screen, ScreenSet, route};
    use crate::models::session::Session;
    use crate::models::user::{User, UserRole};

    fn signed_in(role: UserRole) -> Session {
        Session::authenticated(
            User::first_login("9999999999", role, 1),
            "token_1".to_string(),
        )
    }

    #[test]
    fn unauthenticated_session_routes_to_auth() {
        assert_eq!(route(&Session::default()), ScreenSet::Auth);
    }

    #[test]
    fn roles_route_to_their_screens() {
        assert_eq!(route(&signed_in(UserRole::Customer)), ScreenSet::Customer);
        assert_eq!(route(&signed_in(UserRole::Partner)), ScreenSet::Partner);
        assert_eq!(ScreenSet::Customer.entry(), Screen::CustomerDashboard);
    }

    #[test]
    fn user_without_authentication_flag_is_not_routed_in() {
        let mut session = signed_in(UserRole::Partner);
        session.is_authenticated = false;
        assert_eq!(route(&session), ScreenSet::Auth);
    }
}
