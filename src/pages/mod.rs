//! Page state for the post list and post detail routes

pub mod comments;
pub mod detail;
pub mod list;

pub use comments::{CommentEmbed, CommentWidget};
pub use detail::{load_post, static_paths, PostPage, REDIRECT_TARGET};
pub use list::{LoadMore, PostList};
