//! Dashboard landing and navigation.
//!
//! The dashboard has no neutral page: the bare `/dashboard` path always
//! forwards to a role-appropriate landing page, and the side menu is
//! composed per role.

use hillcrest_access::Role;

/// Where a role lands inside the dashboard.
#[must_use]
pub fn default_landing_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/dashboard/admin-profile",
        Role::User | Role::Member => "/dashboard/my-profile",
    }
}

/// Navigation for the bare dashboard root.
///
/// Returns `Some(target)` when the path is exactly `/dashboard`; deeper
/// paths stay where they are.
#[must_use]
pub fn dashboard_redirect(path: &str, role: Role) -> Option<&'static str> {
    (path == "/dashboard").then(|| default_landing_path(role))
}

/// One entry in the dashboard side menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    /// Navigation to a dashboard page.
    Link {
        path: &'static str,
        label: &'static str,
    },
    /// The sign-out action.
    SignOut,
}

/// Composes the side menu for a role.
///
/// Non-admin roles share the profile and announcements pages, with the
/// payment pages inserted for members. Admins see only the management
/// pages. Every menu ends with the home link and sign-out.
#[must_use]
pub fn menu_for(role: Role) -> Vec<MenuEntry> {
    let mut menu = Vec::new();
    match role {
        Role::User | Role::Member => {
            menu.push(MenuEntry::Link {
                path: "/dashboard/my-profile",
                label: "My Profile",
            });
            if role == Role::Member {
                menu.push(MenuEntry::Link {
                    path: "/dashboard/make-payment",
                    label: "Make Payment",
                });
                menu.push(MenuEntry::Link {
                    path: "/dashboard/payment-history",
                    label: "Payment History",
                });
            }
            menu.push(MenuEntry::Link {
                path: "/dashboard/announcements",
                label: "Announcements",
            });
        }
        Role::Admin => {
            menu.push(MenuEntry::Link {
                path: "/dashboard/admin-profile",
                label: "Admin Profile",
            });
            menu.push(MenuEntry::Link {
                path: "/dashboard/agreement-requests",
                label: "Agreement Requests",
            });
            menu.push(MenuEntry::Link {
                path: "/dashboard/manage-members",
                label: "Manage Members",
            });
            menu.push(MenuEntry::Link {
                path: "/dashboard/make-announcement",
                label: "Make Announcement",
            });
            menu.push(MenuEntry::Link {
                path: "/dashboard/manage-coupons",
                label: "Manage Coupons",
            });
        }
    }
    menu.push(MenuEntry::Link {
        path: "/",
        label: "Back to Home",
    });
    menu.push(MenuEntry::SignOut);
    menu
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(menu: &[MenuEntry]) -> Vec<&'static str> {
        menu.iter()
            .filter_map(|entry| match entry {
                MenuEntry::Link { label, .. } => Some(*label),
                MenuEntry::SignOut => None,
            })
            .collect()
    }

    #[test]
    fn admin_lands_on_admin_profile() {
        assert_eq!(default_landing_path(Role::Admin), "/dashboard/admin-profile");
        assert_eq!(default_landing_path(Role::User), "/dashboard/my-profile");
        assert_eq!(default_landing_path(Role::Member), "/dashboard/my-profile");
    }

    #[test]
    fn bare_dashboard_root_redirects() {
        assert_eq!(
            dashboard_redirect("/dashboard", Role::Member),
            Some("/dashboard/my-profile")
        );
        assert_eq!(
            dashboard_redirect("/dashboard", Role::Admin),
            Some("/dashboard/admin-profile")
        );
        assert_eq!(dashboard_redirect("/dashboard/my-profile", Role::Member), None);
    }

    #[test]
    fn user_menu_has_no_payment_pages() {
        assert_eq!(
            labels(&menu_for(Role::User)),
            vec!["My Profile", "Announcements", "Back to Home"]
        );
    }

    #[test]
    fn member_menu_inserts_payment_pages() {
        assert_eq!(
            labels(&menu_for(Role::Member)),
            vec![
                "My Profile",
                "Make Payment",
                "Payment History",
                "Announcements",
                "Back to Home"
            ]
        );
    }

    #[test]
    fn admin_menu_is_management_only() {
        assert_eq!(
            labels(&menu_for(Role::Admin)),
            vec![
                "Admin Profile",
                "Agreement Requests",
                "Manage Members",
                "Make Announcement",
                "Manage Coupons",
                "Back to Home"
            ]
        );
    }

    #[test]
    fn every_menu_ends_with_sign_out() {
        for role in [Role::User, Role::Member, Role::Admin] {
            assert_eq!(menu_for(role).last(), Some(&MenuEntry::SignOut));
        }
    }
}
