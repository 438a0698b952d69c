//! Raw HTML inside Markdown: tag pairing and link rewriting.
//!
//! comrak keeps inline HTML as separate nodes for each tag, so
//!
//! ```markdown
//! foo <a href="bar.md">bar</a> baz
//! ```
//!
//! yields `Text`, `HtmlInline("<a href=\"bar.md\">")`, `Text`,
//! `HtmlInline("</a>")`, `Text`. [`collect`] matches those opening and
//! closing nodes up so that the element can be reparsed as a whole when its
//! `href` needs rewriting.

use std::sync::LazyLock;

use comrak::nodes::{AstNode, NodeValue};
use kuchikikiki::{NodeRef, parse_html};
use markup5ever::local_name;
use regex::Regex;
use tendril::TendrilSink;

#[allow(clippy::expect_used, reason = "patterns are compile-time constants")]
static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^<([A-Za-z][A-Za-z0-9-]*)(?:\s[^>]*)?>$").expect("valid open-tag pattern")
});

#[allow(clippy::expect_used, reason = "patterns are compile-time constants")]
static CLOSE_TAG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)</[a-z][a-z0-9-]*\s*>").expect("valid close-tag pattern")
});

#[allow(clippy::expect_used, reason = "patterns are compile-time constants")]
static WHOLE_CLOSE_TAG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^</([A-Za-z][A-Za-z0-9-]*)\s*>$").expect("valid close-tag pattern")
});

/// Opening and closing inline HTML nodes of the same element.
#[derive(Debug, Clone, Copy)]
pub struct Pair<'a> {
  pub open:  &'a AstNode<'a>,
  pub close: &'a AstNode<'a>,
}

/// Every raw HTML node of a document, sorted into the forms that get
/// rewritten differently.
#[derive(Debug, Default)]
pub struct HtmlNodes<'a> {
  /// Matched open/close inline tags, ordered by the opening tag.
  pub pairs:  Vec<Pair<'a>>,
  /// Inline HTML nodes that are not part of a pair.
  pub inline: Vec<&'a AstNode<'a>>,
  pub blocks: Vec<&'a AstNode<'a>>,
}

enum Tag {
  Open(String),
  Close(String),
}

fn classify(html: &str) -> Option<Tag> {
  let html = html.trim();
  if let Some(caps) = WHOLE_CLOSE_TAG.captures(html) {
    return Some(Tag::Close(caps[1].to_ascii_lowercase()));
  }
  if html.ends_with("/>") {
    return None;
  }
  OPEN_TAG
    .captures(html)
    .map(|caps| Tag::Open(caps[1].to_ascii_lowercase()))
}

/// Finds the raw HTML nodes under `root` and pairs up inline tags.
#[must_use]
pub fn collect<'a>(root: &'a AstNode<'a>) -> HtmlNodes<'a> {
  let mut nodes = HtmlNodes::default();
  // (tag name, node, index into `inline` at the time it was seen)
  let mut stack: Vec<(String, &'a AstNode<'a>, usize)> = Vec::new();
  let mut paired: Vec<(usize, Pair<'a>)> = Vec::new();
  let mut inline: Vec<&'a AstNode<'a>> = Vec::new();

  for node in root.descendants() {
    let tag = match &node.data.borrow().value {
      NodeValue::HtmlBlock(_) => {
        nodes.blocks.push(node);
        continue;
      },
      NodeValue::HtmlInline(html) => classify(html),
      _ => continue,
    };

    let idx = inline.len();
    inline.push(node);
    match tag {
      Some(Tag::Open(name)) => stack.push((name, node, idx)),
      Some(Tag::Close(name)) => {
        if let Some(pos) = stack.iter().rposition(|(open, ..)| *open == name) {
          let (_, open, open_idx) = stack[pos];
          stack.truncate(pos);
          paired.push((open_idx, Pair { open, close: node }));
        }
      },
      None => {},
    }
  }

  paired.sort_by_key(|&(idx, _)| idx);
  nodes.inline = inline
    .into_iter()
    .filter(|node| {
      !paired
        .iter()
        .any(|(_, p)| std::ptr::eq(p.open, *node) || std::ptr::eq(p.close, *node))
    })
    .collect();
  nodes.pairs = paired.into_iter().map(|(_, pair)| pair).collect();
  nodes
}

fn inline_html<'a>(node: &'a AstNode<'a>) -> Option<String> {
  match &node.data.borrow().value {
    NodeValue::HtmlInline(html) => Some(html.clone()),
    _ => None,
  }
}

fn set_inline_html<'a>(node: &'a AstNode<'a>, new: String) {
  if let NodeValue::HtmlInline(html) = &mut node.data.borrow_mut().value {
    *html = new;
  }
}

/// Rewrites the `href`/`src` of a paired element through `resolve`.
/// Returns whether anything changed.
pub fn rewrite_pair<'a>(
  pair: &Pair<'a>,
  resolve: &mut impl FnMut(&str) -> String,
) -> bool {
  let (Some(open), Some(close)) = (inline_html(pair.open), inline_html(pair.close))
  else {
    return false;
  };

  let Some(html) = rewrite_fragment(&format!("{open}{close}"), resolve) else {
    return false;
  };
  let Some(m) = CLOSE_TAG.find(&html) else {
    log::debug!("Rewritten HTML lost its closing tag: {html:?}");
    return false;
  };
  set_inline_html(pair.open, html[..m.start()].to_owned());
  set_inline_html(pair.close, html[m.start()..m.end()].to_owned());
  true
}

/// Rewrites a lone inline HTML node such as `<img src="...">`.
pub fn rewrite_inline<'a>(
  node: &'a AstNode<'a>,
  resolve: &mut impl FnMut(&str) -> String,
) -> bool {
  let Some(old) = inline_html(node) else {
    return false;
  };
  let Some(html) = rewrite_fragment(&old, resolve) else {
    return false;
  };
  // The DOM closes elements the node left open; keep only the opening part.
  let html = match CLOSE_TAG.find(&html) {
    Some(m) if !CLOSE_TAG.is_match(&old) => html[..m.start()].to_owned(),
    _ => html,
  };
  set_inline_html(node, html);
  true
}

/// Rewrites every link and image in an HTML block.
pub fn rewrite_block<'a>(
  node: &'a AstNode<'a>,
  resolve: &mut impl FnMut(&str) -> String,
) -> bool {
  let old = match &node.data.borrow().value {
    NodeValue::HtmlBlock(block) => block.literal.clone(),
    _ => return false,
  };
  let Some(mut html) = rewrite_fragment(&old, resolve) else {
    return false;
  };
  if old.ends_with('\n') && !html.ends_with('\n') {
    html.push('\n');
  }
  if let NodeValue::HtmlBlock(block) = &mut node.data.borrow_mut().value {
    block.literal = html;
  }
  true
}

/// Parses `html` as a fragment, passes every `a[href]` and `img[src]` through
/// `resolve`, and serializes the fragment back if any of them changed.
fn rewrite_fragment(html: &str, resolve: &mut impl FnMut(&str) -> String) -> Option<String> {
  let document = parse_html().one(html);
  let roots = fragment_roots(&document);

  let mut changed = false;
  for root in &roots {
    for node in root.inclusive_descendants() {
      let Some(element) = node.as_element() else {
        continue;
      };
      let attr = match element.name.local.as_ref() {
        "a" => local_name!("href"),
        "img" => local_name!("src"),
        _ => continue,
      };

      let mut attributes = element.attributes.borrow_mut();
      let Some(old) = attributes.get(attr.clone()).map(str::to_owned) else {
        continue;
      };
      let new = resolve(&old);
      if new != old {
        attributes.insert(attr, new);
        changed = true;
      }
    }
  }
  if !changed {
    return None;
  }

  let mut buf = Vec::new();
  for root in &roots {
    if let Err(err) = root.serialize(&mut buf) {
      log::warn!("Failed to serialize rewritten HTML: {err}");
      return None;
    }
  }
  String::from_utf8(buf).ok()
}

// The parser wraps fragments in <html><head>..</head><body>..</body></html>.
// The nodes of interest are the children of <head> and <body>.
fn fragment_roots(document: &NodeRef) -> Vec<NodeRef> {
  let mut roots = Vec::new();
  for name in ["head", "body"] {
    let container = document.descendants().find(|node| {
      node
        .as_element()
        .is_some_and(|el| el.name.local.as_ref() == name)
    });
    if let Some(container) = container {
      roots.extend(container.children());
    }
  }
  roots
}
