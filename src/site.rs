//! Site model: the configuration plus every post of one build.

use crate::{
    config::SiteConfig,
    content::{Post, sort_by_date},
};

/// Aggregate root for one build.
///
/// Posts are kept in read order; [`Site::sorted_posts`] gives the
/// newest-first view used for display.
#[derive(Debug)]
pub struct Site<'a> {
    pub config: &'a SiteConfig,
    pub posts: Vec<Post>,
}

impl<'a> Site<'a> {
    pub const fn new(config: &'a SiteConfig, posts: Vec<Post>) -> Self {
        Self { config, posts }
    }

    /// Posts newest first; ties keep read order.
    pub fn sorted_posts(&self) -> Vec<Post> {
        let mut posts = self.posts.clone();
        sort_by_date(&mut posts);
        posts
    }

    /// Links claimed by more than one post, in read order of the later post.
    ///
    /// The later post overwrites the earlier one's output file.
    pub fn link_collisions(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.posts
            .iter()
            .filter(|post| !seen.insert(post.link.as_str()))
            .map(|post| post.link.as_str())
            .collect()
    }
}
