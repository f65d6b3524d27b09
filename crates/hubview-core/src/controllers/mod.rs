//! Controllers that load GitHub data into observable state.
//!
//! - [`UserListController`]: paginated, cached user list
//! - [`UserDetailController`]: profile and repositories of one user

mod user_detail;
mod user_list;

pub use user_detail::{UserDetailChange, UserDetailController, UserDetailField, UserDetailState};
pub use user_list::{UserListChange, UserListController, UserListField, UserListState};
