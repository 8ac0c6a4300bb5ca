//! # Users and Roles
//!
//! One `User` struct with a `Role` tag; access rules are free functions
//! matching on the role.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────────────────┐
//! │ Role         │ Resources                                                │
//! ├──────────────┼──────────────────────────────────────────────────────────┤
//! │ customer     │ books, cart, orders, profile                             │
//! │ admin        │ books, users, orders (manage_*), plus view_analytics     │
//! └──────────────┴──────────────────────────────────────────────────────────┘
//! ```
//! Inactive accounts can access nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::BookId;
use crate::validation::{validate_email, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    /// Unrecognised role strings fall back to customer.
    pub fn from_label(label: &str) -> Role {
        if label.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Customer
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Books,
    Cart,
    Orders,
    Profile,
    Users,
    Analytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageBooks,
    ManageUsers,
    ManageOrders,
    ViewAnalytics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(default)]
    pub wishlist: Vec<BookId>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        email: &str,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: Role,
    ) -> ValidationResult<Self> {
        validate_email(email)?;
        Ok(User {
            id: id.into(),
            email: email.trim().to_string(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
            is_active: true,
            wishlist: Vec::new(),
            created_at: Utc::now(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// First name, or the local part of the email when no name is set.
    pub fn display_name(&self) -> &str {
        if !self.first_name.is_empty() {
            return &self.first_name;
        }
        self.email.split('@').next().unwrap_or(&self.email)
    }

    /// Adds a book to the wishlist; returns false if it was already there.
    pub fn add_to_wishlist(&mut self, book_id: BookId) -> bool {
        if self.wishlist.contains(&book_id) {
            return false;
        }
        self.wishlist.push(book_id);
        true
    }

    pub fn remove_from_wishlist(&mut self, book_id: &BookId) -> bool {
        let before = self.wishlist.len();
        self.wishlist.retain(|id| id != book_id);
        self.wishlist.len() != before
    }
}

/// Permissions granted to a role. Customers hold none.
pub fn permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Customer => &[],
        Role::Admin => &[
            Permission::ManageBooks,
            Permission::ManageUsers,
            Permission::ManageOrders,
            Permission::ViewAnalytics,
        ],
    }
}

pub fn has_permission(user: &User, permission: Permission) -> bool {
    user.is_active && permissions(user.role).contains(&permission)
}

/// Checks whether `user` may open `resource`.
pub fn can_access(user: &User, resource: Resource) -> bool {
    if !user.is_active {
        return false;
    }

    match user.role {
        Role::Customer => matches!(
            resource,
            Resource::Books | Resource::Cart | Resource::Orders | Resource::Profile
        ),
        Role::Admin => {
            let needed = match resource {
                Resource::Books => Permission::ManageBooks,
                Resource::Users => Permission::ManageUsers,
                Resource::Orders => Permission::ManageOrders,
                Resource::Analytics => Permission::ViewAnalytics,
                Resource::Cart | Resource::Profile => return false,
            };
            permissions(Role::Admin).contains(&needed)
        }
    }
}
