//! Grouping comments around an anchor comment.

use crate::comments::Comment;
use crate::retrieval::Index;
use serde::Serialize;

/// Clustering limits.
#[derive(Debug, Clone, Copy)]
pub struct ClusterOptions {
    /// How many nearest comments to consider.
    pub k: usize,
    /// Minimum normalized score for a comment to join.
    pub min_normalized_score: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            k: 20,
            min_normalized_score: 0.35,
        }
    }
}

/// A comment in a cluster.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterMember {
    /// Position of the comment in the indexed slice.
    pub index: usize,
    pub comment: Comment,
    /// Normalized similarity to the anchor; 1 for the anchor itself.
    pub score: f64,
    pub is_anchor: bool,
}

/// Comments similar to `comments[anchor]`, anchor first when it was not
/// itself among the matches.
///
/// `index` must have been built over the texts of `comments`. An anchor with
/// no tokens, an out-of-range anchor, or a query with no matches gives an
/// empty cluster.
pub fn cluster(index: &Index, comments: &[Comment], anchor: usize, options: ClusterOptions) -> Vec<ClusterMember> {
    let Some(anchor_comment) = comments.get(anchor) else {
        return Vec::new();
    };
    if anchor_comment.text.trim().is_empty() {
        return Vec::new();
    }

    let hits = index.search(&anchor_comment.text, options.k);
    if hits.is_empty() {
        return Vec::new();
    }

    let mut members: Vec<ClusterMember> = hits
        .iter()
        .filter(|hit| hit.doc_id == anchor || hit.normalized_score >= options.min_normalized_score)
        .filter_map(|hit| {
            let comment = comments.get(hit.doc_id)?;
            let is_anchor = hit.doc_id == anchor;
            Some(ClusterMember {
                index: hit.doc_id,
                comment: comment.clone(),
                score: if is_anchor { 1.0 } else { hit.normalized_score },
                is_anchor,
            })
        })
        .collect();

    if !members.iter().any(|m| m.is_anchor) {
        members.insert(
            0,
            ClusterMember {
                index: anchor,
                comment: anchor_comment.clone(),
                score: 1.0,
                is_anchor: true,
            },
        );
    }

    members
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comments(texts: &[&str]) -> Vec<Comment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Comment::new(format!("c{}", i), *t, i as u64))
            .collect()
    }

    fn index_for(comments: &[Comment]) -> Index {
        let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
        Index::build(&texts)
    }

    #[test]
    fn test_cluster_groups_similar_comments() {
        let comments = comments(&[
            "the drum solo was unreal",
            "that unreal drum solo though",
            "who else is here in 2024",
            "unreal drum solo",
        ]);
        let index = index_for(&comments);
        let members = cluster(&index, &comments, 0, ClusterOptions::default());

        let ids: Vec<usize> = members.iter().map(|m| m.index).collect();
        assert_eq!(ids[0], 0);
        assert!(ids.contains(&1));
        assert!(ids.contains(&3));
        assert!(!ids.contains(&2));
        assert!(members[0].is_anchor);
        assert_eq!(members[0].score, 1.0);
        assert_eq!(members.iter().filter(|m| m.is_anchor).count(), 1);
    }

    #[test]
    fn test_anchor_is_prepended_when_outside_top_k() {
        // Document 1 outranks the anchor on the shared token.
        let comments = comments(&["wow", "wow wow wow", "wow wow"]);
        let index = index_for(&comments);
        let members = cluster(
            &index,
            &comments,
            0,
            ClusterOptions {
                k: 1,
                min_normalized_score: 0.0,
            },
        );

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].index, 0);
        assert!(members[0].is_anchor);
        assert_eq!(members[1].index, 1);
        assert!(!members[1].is_anchor);
    }

    #[test]
    fn test_anchor_kept_below_threshold() {
        let comments = comments(&["wow", "wow wow wow wow wow"]);
        let index = index_for(&comments);
        let members = cluster(
            &index,
            &comments,
            0,
            ClusterOptions {
                k: 5,
                min_normalized_score: 0.9,
            },
        );

        assert_eq!(members.len(), 2);
        assert!(members.iter().any(|m| m.is_anchor && m.index == 0));
    }

    #[test]
    fn test_empty_anchor_or_no_matches() {
        let comments = comments(&["", "!!!", "something"]);
        let index = index_for(&comments);
        assert!(cluster(&index, &comments, 0, ClusterOptions::default()).is_empty());
        assert!(cluster(&index, &comments, 1, ClusterOptions::default()).is_empty());
        assert!(cluster(&index, &comments, 9, ClusterOptions::default()).is_empty());
    }
}
