//! Category-tagged block filtering for playlist fragments.
//!
//! Fragments mark conditional content with comment markers carrying a
//! semicolon-separated list of required tags:
//!
//! ```text
//! <!-- begin_categories news;lobby -->
//! <video src="news.mp4" region="screen" />
//! <!-- end_categories news;lobby -->
//! ```
//!
//! A block is kept (markers stripped, content left in place) when any of the
//! player's category groups is a subset of the block's tags, and dropped
//! entirely otherwise. Nested blocks inside kept blocks are decided the
//! same way. [`parse`] exposes the top-level structure as [`Node`]s.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::types::CategoryGroup;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Keyword opening a category block.
pub const BEGIN_KEYWORD: &str = "begin_categories";
/// Keyword closing a category block.
pub const END_KEYWORD: &str = "end_categories";

/// A parsed piece of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    /// Text outside any complete block, including unmatched markers.
    Text(&'a str),
    /// A complete marker-to-marker block.
    Block(Block<'a>),
}

/// A category block: required tags plus the text between its markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub required: BTreeSet<String>,
    pub inner: &'a str,
}

impl Block<'_> {
    /// Returns true if any of `categories` selects this block.
    pub fn is_selected_by(&self, categories: &[CategoryGroup]) -> bool {
        categories.iter().any(|group| group.matches(&self.required))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Begin,
    End,
}

#[derive(Debug, Clone, Copy)]
struct Marker<'a> {
    kind: MarkerKind,
    tags: &'a str,
    start: usize,
    end: usize,
}

/// Split a raw tag list into its trimmed, non-empty tags.
fn split_tags(tags: &str) -> Vec<&str> {
    tags.split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn classify(body: &str) -> Option<(MarkerKind, &str)> {
    for (kind, keyword) in [(MarkerKind::Begin, BEGIN_KEYWORD), (MarkerKind::End, END_KEYWORD)] {
        if let Some(rest) = body.strip_prefix(keyword) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Some((kind, rest.trim()));
            }
        }
    }
    None
}

/// Find the next category marker at or after byte offset `from`.
///
/// Comments do not nest: a comment that is not a marker is skipped whole.
fn next_marker(text: &str, mut from: usize) -> Option<Marker<'_>> {
    while let Some(rel) = text[from..].find(COMMENT_OPEN) {
        let start = from + rel;
        let body_start = start + COMMENT_OPEN.len();
        let close_rel = text[body_start..].find(COMMENT_CLOSE)?;
        let body = &text[body_start..body_start + close_rel];
        let end = body_start + close_rel + COMMENT_CLOSE.len();
        if let Some((kind, tags)) = classify(body.trim()) {
            return Some(Marker {
                kind,
                tags,
                start,
                end,
            });
        }
        from = end;
    }
    None
}

/// Every marker of a fragment with its partner, if any.
///
/// Markers are tokenized in one pass. Begin and end markers pair by
/// nesting depth among markers with the identical tag list, so
/// `begin x, begin x, end x, end x` pairs outer with outer.
struct Markers<'a> {
    markers: Vec<Marker<'a>>,
    partner: Vec<Option<usize>>,
}

impl<'a> Markers<'a> {
    fn scan(fragment: &'a str) -> Self {
        let mut markers = Vec::new();
        let mut from = 0;
        while let Some(marker) = next_marker(fragment, from) {
            from = marker.end;
            markers.push(marker);
        }

        let mut partner = vec![None; markers.len()];
        let mut open: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
        for (index, marker) in markers.iter().enumerate() {
            let key = split_tags(marker.tags);
            match marker.kind {
                MarkerKind::Begin => open.entry(key).or_default().push(index),
                MarkerKind::End => {
                    if let Some(begin) = open.get_mut(&key).and_then(Vec::pop) {
                        partner[begin] = Some(index);
                        partner[index] = Some(begin);
                    }
                }
            }
        }

        Self { markers, partner }
    }

    /// The block opened by marker `index`, with the index of its end marker.
    fn block(&self, fragment: &'a str, index: usize) -> Option<(Block<'a>, usize)> {
        let begin = &self.markers[index];
        if begin.kind != MarkerKind::Begin {
            return None;
        }
        let close = self.partner[index]?;
        let block = Block {
            required: split_tags(begin.tags).into_iter().map(String::from).collect(),
            inner: &fragment[begin.end..self.markers[close].start],
        };
        Some((block, close))
    }
}

/// Parse a fragment into top-level text and block nodes.
///
/// A begin marker without a partner, and any stray end marker, stay in the
/// text. Markers inside a block are left in its `inner` text.
pub fn parse(fragment: &str) -> Vec<Node<'_>> {
    let scanned = Markers::scan(fragment);
    let mut nodes = Vec::new();
    let mut cursor = 0;
    let mut index = 0;

    while index < scanned.markers.len() {
        let Some((block, close)) = scanned.block(fragment, index) else {
            index += 1;
            continue;
        };
        let open = &scanned.markers[index];
        if open.start > cursor {
            nodes.push(Node::Text(&fragment[cursor..open.start]));
        }
        nodes.push(Node::Block(block));
        cursor = scanned.markers[close].end;
        index = close + 1;
    }

    if cursor < fragment.len() {
        nodes.push(Node::Text(&fragment[cursor..]));
    }
    nodes
}

/// Filter a fragment against the player's category groups.
///
/// Kept blocks lose their markers, dropped blocks disappear with their
/// content, and nested blocks inside kept ones are decided the same way.
/// Runs in a single pass over the markers.
pub fn filter(fragment: &str, categories: &[CategoryGroup]) -> String {
    let scanned = Markers::scan(fragment);
    let mut out = String::with_capacity(fragment.len());
    let mut strip = vec![false; scanned.markers.len()];
    let mut cursor = 0;
    let mut index = 0;
    let mut kept = 0usize;
    let mut dropped = 0usize;

    while index < scanned.markers.len() {
        let marker = &scanned.markers[index];
        match scanned.block(fragment, index) {
            Some((block, close)) => {
                out.push_str(&fragment[cursor..marker.start]);
                if block.is_selected_by(categories) {
                    kept += 1;
                    strip[close] = true;
                    cursor = marker.end;
                    index += 1;
                } else {
                    dropped += 1;
                    cursor = scanned.markers[close].end;
                    index = close + 1;
                }
            }
            None if strip[index] => {
                out.push_str(&fragment[cursor..marker.start]);
                cursor = marker.end;
                index += 1;
            }
            None => index += 1,
        }
    }
    out.push_str(&fragment[cursor..]);

    if kept + dropped > 0 {
        debug!("Category blocks: {} kept, {} dropped", kept, dropped);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const AB_BLOCK: &str = "<!-- begin_categories a;b --> X <!-- end_categories a;b -->";

    #[test]
    fn test_matching_group_keeps_content() {
        let groups = vec![CategoryGroup::new(["a", "b"])];
        assert_eq!(filter(AB_BLOCK, &groups), " X ");
    }

    #[test]
    fn test_superset_group_removes_block() {
        let groups = vec![CategoryGroup::new(["a", "b", "c"])];
        assert_eq!(filter(AB_BLOCK, &groups), "");
    }

    #[test]
    fn test_subset_group_keeps_content() {
        let groups = vec![CategoryGroup::new(["b"])];
        assert_eq!(filter(AB_BLOCK, &groups), " X ");
    }

    #[test]
    fn test_any_group_is_enough() {
        let groups = vec![CategoryGroup::new(["z"]), CategoryGroup::new(["a"])];
        assert_eq!(filter(AB_BLOCK, &groups), " X ");
    }

    #[test]
    fn test_empty_group_never_matches() {
        let groups = vec![CategoryGroup::default()];
        assert_eq!(filter(AB_BLOCK, &groups), "");
    }

    #[test]
    fn test_fragment_without_markers_is_unchanged() {
        let fragment = "<seq>\n  <img src=\"a.jpg\" dur=\"10s\" />\n</seq>\n<!-- plain comment -->";
        assert_eq!(filter(fragment, &[]), fragment);
    }

    #[test]
    fn test_no_categories_removes_every_block_idempotently() {
        let fragment = "head\n<!-- begin_categories a -->A<!-- end_categories a -->\nmid\n\
                        <!-- begin_categories b;c -->BC<!-- end_categories b;c -->\ntail";
        let once = filter(fragment, &[]);
        assert_eq!(once, "head\n\nmid\n\ntail");
        assert_eq!(filter(&once, &[]), once);
    }

    #[test]
    fn test_keep_path_leaves_no_markers() {
        let groups = vec![CategoryGroup::new(["a", "b"])];
        let once = filter(AB_BLOCK, &groups);
        assert!(parse(&once).iter().all(|n| matches!(n, Node::Text(_))));
        assert_eq!(filter(&once, &groups), once);
    }

    #[test]
    fn test_repeated_tag_lists_are_matched_non_greedily() {
        let fragment = "<!-- begin_categories x -->1<!-- end_categories x -->-\
                        <!-- begin_categories x -->2<!-- end_categories x -->";
        let nodes = parse(fragment);
        assert_eq!(nodes.len(), 3);
        assert_eq!(filter(fragment, &[CategoryGroup::new(["x"])]), "1-2");
        assert_eq!(filter(fragment, &[]), "-");
    }

    #[test]
    fn test_tag_lists_must_match_exactly() {
        let fragment = "<!-- begin_categories a;b -->X<!-- end_categories a -->\
                        <!-- end_categories a;b -->";
        let groups = vec![CategoryGroup::new(["a"])];
        assert_eq!(filter(fragment, &groups), "X<!-- end_categories a -->");
    }

    #[test]
    fn test_whitespace_around_tags_is_ignored() {
        let fragment = "<!--begin_categories  a ; b-->X<!-- end_categories a;b -->";
        assert_eq!(filter(fragment, &[CategoryGroup::new(["a", "b"])]), "X");
    }

    #[test]
    fn test_nested_blocks_are_resolved() {
        let fragment = "<!-- begin_categories a -->[outer\
                        <!-- begin_categories b -->inner<!-- end_categories b -->\
                        ]<!-- end_categories a -->";
        assert_eq!(filter(fragment, &[CategoryGroup::new(["a"])]), "[outer]");
        assert_eq!(
            filter(fragment, &[CategoryGroup::new(["a"]), CategoryGroup::new(["b"])]),
            "[outerinner]"
        );
    }

    #[test]
    fn test_unterminated_block_is_left_as_text() {
        let fragment = "<!-- begin_categories a --> dangling";
        assert_eq!(filter(fragment, &[]), fragment);
        assert_eq!(filter(fragment, &[CategoryGroup::new(["a"])]), fragment);
    }

    #[test]
    fn test_identical_nested_tag_lists_pair_by_depth() {
        let fragment = "<!-- begin_categories x -->A<!-- begin_categories x -->B\
                        <!-- end_categories x -->C<!-- end_categories x -->D";
        let groups = vec![CategoryGroup::new(["x"])];

        let once = filter(fragment, &groups);
        assert_eq!(once, "ABCD");
        assert_eq!(filter(&once, &groups), once);

        assert_eq!(filter(fragment, &[]), "D");
        assert_eq!(parse(fragment).len(), 2);
    }

    #[test]
    fn test_crossed_blocks_leave_no_partnered_markers() {
        let fragment = "<!-- begin_categories a -->1<!-- begin_categories b -->2\
                        <!-- end_categories a -->3<!-- end_categories b -->";
        let both = vec![CategoryGroup::new(["a"]), CategoryGroup::new(["b"])];
        assert_eq!(filter(fragment, &both), "123");
        assert_eq!(filter(fragment, &[CategoryGroup::new(["a"])]), "1");
    }

    #[test]
    fn test_many_unmatched_begins_stay_as_text() {
        let fragment = "<!-- begin_categories a -->x".repeat(20_000);
        assert_eq!(filter(&fragment, &[]), fragment);
        assert_eq!(parse(&fragment), vec![Node::Text(&fragment)]);

        let closed = format!("{}<!-- end_categories a -->", fragment);
        assert_eq!(filter(&closed, &[]), "<!-- begin_categories a -->x".repeat(19_999));
    }

    #[test]
    fn test_markers_inside_plain_comments_are_ignored() {
        let fragment = "<!-- note: <!-- begin_categories a --> keep <!-- end_categories a -->";
        assert_eq!(filter(fragment, &[]), fragment);
        assert_eq!(parse(fragment), vec![Node::Text(fragment)]);
    }

    #[test]
    fn test_unclosed_comment_is_left_as_text() {
        let fragment = "before <!-- begin_categories a";
        assert_eq!(parse(fragment), vec![Node::Text(fragment)]);
    }
}
