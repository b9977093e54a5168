//! Content module - post projections shaped from repository documents

mod post;

pub use post::{reading_time, ContentBlock, NavPost, PostDetail, PostSummary, WORDS_PER_MINUTE};
