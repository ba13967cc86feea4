//! Conversation-id derivation for threaded replies.
//!
//! A reply shares the conversation of its thread root, so the id is a
//! pure function of (comment id, parent id) with no external state. The
//! computed value is memoized on the comment row once stored.

/// Derive the conversation id for a comment.
///
/// Top-level comments start their own conversation; replies join the
/// parent's.
pub fn conversation_id(comment_id: &str, parent_id: Option<&str>) -> String {
    match parent_id {
        Some(parent) => format!("first_question_comment_{parent}"),
        None => format!("first_question_comment_{comment_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_comment_uses_own_id() {
        assert_eq!(conversation_id("c1", None), "first_question_comment_c1");
    }

    #[test]
    fn reply_uses_parent_id() {
        assert_eq!(
            conversation_id("c2", Some("c1")),
            "first_question_comment_c1"
        );
    }

    #[test]
    fn siblings_share_a_conversation() {
        let a = conversation_id("c2", Some("c1"));
        let b = conversation_id("c3", Some("c1"));
        assert_eq!(a, b);
    }
}
