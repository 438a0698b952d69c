//! Heading outlines for files that absorb their headings into the parent
//! table of contents.

use comrak::nodes::{AstNode, NodeLink, NodeList, NodeValue};

use crate::markdown::{Arena, new_node};

/// One entry of a heading outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocItem {
  pub title: String,
  pub id:    String,
  pub items: Vec<Self>,
}

/// A heading as seen by [`inspect`].
#[derive(Debug, Clone, Copy)]
pub struct OutlineHeading<'h> {
  pub level: i32,
  pub title: &'h str,
  pub id:    &'h str,
}

/// Builds a nested outline from headings in document order.
///
/// Each heading nests under the closest preceding heading with a lower
/// level. Skipped levels do not produce empty intermediate entries.
#[must_use]
pub fn inspect<'h>(headings: impl IntoIterator<Item = OutlineHeading<'h>>) -> Vec<TocItem> {
  // Path of (level, index) pairs from the root to the current entry.
  let mut path: Vec<(i32, usize)> = Vec::new();
  let mut items: Vec<TocItem> = Vec::new();

  for heading in headings {
    while path.last().is_some_and(|&(level, _)| level >= heading.level) {
      path.pop();
    }

    let mut siblings = &mut items;
    for &(_, idx) in &path {
      siblings = &mut siblings[idx].items;
    }
    siblings.push(TocItem {
      title: heading.title.to_owned(),
      id:    heading.id.to_owned(),
      items: Vec::new(),
    });
    path.push((heading.level, siblings.len() - 1));
  }
  items
}

/// Renders an outline as a Markdown list of `[title](#id)` links using the
/// given list style. Returns `None` for an empty outline.
pub fn render_list<'a>(
  arena: &'a Arena<'a>,
  style: NodeList,
  items: &[TocItem],
) -> Option<&'a AstNode<'a>> {
  if items.is_empty() {
    return None;
  }

  let list = new_node(arena, NodeValue::List(style));
  for item in items {
    let li = new_node(arena, NodeValue::Item(style));
    let para = new_node(arena, NodeValue::Paragraph);
    let link = new_node(
      arena,
      NodeValue::Link(
        NodeLink {
          url:   format!("#{}", item.id),
          title: String::new(),
        }
        .into(),
      ),
    );
    link.append(new_node(arena, NodeValue::Text(item.title.clone().into())));
    para.append(link);
    li.append(para);
    if let Some(sublist) = render_list(arena, style, &item.items) {
      li.append(sublist);
    }
    list.append(li);
  }
  Some(list)
}
