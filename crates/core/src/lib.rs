//! Core of the Meraki Slack bot: configuration, the error taxonomy shared by
//! every crate, the `Organization` record, and the pagination logic that the
//! Slack renderer builds on.

pub mod config;
pub mod domain;
pub mod errors;
pub mod pagination;

pub use domain::organization::{ApiAccess, Organization, OrganizationId};
pub use errors::{ApplicationError, InterfaceError};
pub use pagination::{
    navigation_controls, parse_page_args, partition, NavControl, PageArgs, PageSize,
    PaginationError, Partition, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
