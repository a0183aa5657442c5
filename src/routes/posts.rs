//! Placeholder posts until posts are stored for real.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub author: String,
    pub body: String,
}

impl Post {
    fn new(author: &str, body: &str) -> Self {
        Self {
            author: author.to_string(),
            body: body.to_string(),
        }
    }
}

/// Home page timeline.
pub fn sample_timeline() -> Vec<Post> {
    vec![
        Post::new("John", "What a beautiful Christmas!"),
        Post::new("Christie", "Why, thank you John!"),
        Post::new("John", "I wasn't talking about you Christie. Not everything is about you."),
        Post::new("Christie", "Well John, I see somebody is still bitter about the divorce."),
        Post::new("John", "Well Christie, I see somebody still is not able to read."),
        Post::new("Christie", "Jesus John, when will you ever grow up. You child."),
        Post::new("John", "At least I can read Christie."),
    ]
}

pub fn profile_posts(username: &str) -> Vec<Post> {
    vec![
        Post::new(username, "Test post #1"),
        Post::new(username, "Test post #2"),
    ]
}
