//! User roles and organisational departments.
//!
//! Database values must match the CHECK constraints in
//! `20250101000001_create_users_table.sql`.

use crate::types::define_str_enum;

define_str_enum! {
    /// Closed set of roles. Each role maps to a fixed capability set in
    /// [`crate::access`].
    Role {
        SuperAdmin => "super_admin",
        Admin => "admin",
        Employee => "employee",
    }
}

define_str_enum! {
    /// Department a user belongs to.
    Department {
        Hr => "hr",
        Tech => "tech",
        Consulting => "consulting",
        Management => "management",
        Finance => "finance",
        Operations => "operations",
    }
}

impl Role {
    /// `true` for roles that manage inventory and see other users' data.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}
