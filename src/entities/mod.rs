pub mod prelude;

pub mod admins;
pub mod comment_likes;
pub mod comments;
pub mod report_likes;
pub mod reports;
