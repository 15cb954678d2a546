//! Route guarding and dashboard navigation for Hillcrest.
//!
//! A navigation is evaluated in two steps: the route table
//! ([`routes::requirement_for`]) says what a path demands, and the
//! [`RouteGuard`] decides what to do with the live session. Wrong-role
//! navigations land on the role's own dashboard page rather than
//! bouncing an authenticated user back to login.

pub mod dashboard;
pub mod guard;
pub mod requirement;
pub mod routes;

pub use dashboard::{MenuEntry, dashboard_redirect, default_landing_path, menu_for};
pub use guard::{RouteDecision, RouteGuard};
pub use requirement::RouteRequirement;
pub use routes::{ROUTES, Route, requirement_for};
