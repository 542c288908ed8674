//! Services layer - Business logic
//!
//! Services hold repository trait objects, enforce the rules that sit above
//! plain storage (ownership, self-follow, duplicate likes, notification
//! fan-out) and report failures through one error enum per service.

pub mod account;
pub mod catalog;
pub mod notification;
pub mod password;
pub mod post;

pub use account::{AccountError, AccountService, LoginInput, RegisterInput};
pub use catalog::{CatalogError, CatalogService};
pub use notification::{NotificationError, NotificationService};
pub use password::{hash_password, verify_password};
pub use post::{PostError, PostService};
