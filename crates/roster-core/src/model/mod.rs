//! Domain types shared by every layer of the core
//!
//! - [`UserIdentity`] / [`Role`]: who is signed in
//! - [`EmployeeRecord`] / [`EmploymentStatus`]: read-through copies of server records
//! - [`NewEmployee`] / [`EmployeeChanges`]: mutation inputs
//! - [`PageInfo`]: cursor pagination metadata

mod employee;
mod identity;

pub use employee::{
    EmployeeChanges, EmployeeConnection, EmployeeId, EmployeeRecord, EmploymentStatus,
    NewEmployee, PageInfo, StatusChange,
};
pub use identity::{LoginGrant, Role, UserIdentity};
