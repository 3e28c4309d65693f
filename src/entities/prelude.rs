pub use super::admins::Entity as Admins;
pub use super::comment_likes::Entity as CommentLikes;
pub use super::comments::Entity as Comments;
pub use super::report_likes::Entity as ReportLikes;
pub use super::reports::Entity as Reports;
