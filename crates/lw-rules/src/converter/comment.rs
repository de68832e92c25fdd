//! Comment conversion.

use crate::ast::{CommentRule, RuleNode};
use crate::syntax::CommentMarker;

/// AdGuard only accepts `!` comments, so `# text` becomes `! # text`.
pub(super) fn to_adg(rule: &CommentRule) -> Option<Vec<RuleNode>> {
    match rule {
        CommentRule::Simple(simple) if simple.marker == CommentMarker::Hashmark => {
            let mut converted = simple.clone();
            converted.marker = CommentMarker::Regular;
            converted.text = format!(" {}{}", CommentMarker::Hashmark.as_char(), simple.text);
            Some(vec![RuleNode::Comment(CommentRule::Simple(converted))])
        }
        _ => None,
    }
}
