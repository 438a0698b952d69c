//! GitHub-compatible heading slugs and a collision-free ID generator.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

// Characters GitHub drops from heading anchors: punctuation, symbols,
// separators, "other" numbers and control/format/private-use characters.
// Spaces and hyphens survive (they become hyphens), as do characters with
// the Alphabetic property such as circled letters.
#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static REMOVED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"[[\p{No}\p{Pd}\p{Pe}\p{Pi}\p{Pf}\p{Po}\p{Ps}\p{S}\p{Cc}\p{Co}\p{Cf}\p{Z}]--[ \-\p{Alphabetic}]]",
  )
  .expect("valid slug pattern")
});

/// Slugifies a heading title the way GitHub builds heading anchors.
#[must_use]
pub fn slug(title: &str) -> String {
  REMOVED_CHARS
    .replace_all(title, "")
    .chars()
    .flat_map(|c| {
      let c = if c == ' ' { '-' } else { c };
      // One character in, one character out: 'İ' becomes 'i', not "i̇".
      c.to_lowercase().take(1)
    })
    .collect()
}

/// Generates unique heading IDs for a single stitching run.
///
/// The first heading with a given slug gets the bare slug; later ones get
/// `-1`, `-2`, ... appended until an unused ID is found.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
  used: HashSet<String>,
}

impl IdGenerator {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the ID for `title`, and whether it is the unsuffixed slug.
  ///
  /// Renderers derive anchors for the first occurrence of a title on their
  /// own, so callers only need an explicit anchor when this returns `false`.
  pub fn generate_id(&mut self, title: &str) -> (String, bool) {
    let base = slug(title);
    let mut id = base.clone();
    let mut n = 0usize;
    while self.used.contains(&id) {
      n += 1;
      id = format!("{base}-{n}");
    }
    self.used.insert(id.clone());
    (id, n == 0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slug_matches_github_anchors() {
    let cases = [
      ("Hello, world!", "hello-world"),
      ("foo bar", "foo-bar"),
      ("foo-bar", "foo-bar"),
      ("foo_bar", "foo_bar"),
      ("Foo  Bar", "foo--bar"),
      ("C++ (lang)", "c-lang"),
      ("v1.2.3", "v123"),
      ("Ünïcödé Çase", "ünïcödé-çase"),
      ("Emoji 🎉 party", "emoji--party"),
      ("½ price", "-price"),
      ("日本語", "日本語"),
      ("Ⓐ circled", "ⓐ-circled"),
      ("İstanbul", "istanbul"),
      ("", ""),
    ];
    for (title, want) in cases {
      assert_eq!(slug(title), want, "slug({title:?})");
    }
  }

  #[test]
  fn generate_id_suffixes_duplicates() {
    let mut ids = IdGenerator::new();
    assert_eq!(ids.generate_id("Hello, world!"), ("hello-world".into(), true));
    assert_eq!(
      ids.generate_id("Hello, world!"),
      ("hello-world-1".into(), false)
    );
    assert_eq!(
      ids.generate_id("hello world"),
      ("hello-world-2".into(), false)
    );
    assert_eq!(ids.generate_id("Other"), ("other".into(), true));
  }

  #[test]
  fn generate_id_skips_taken_suffixes() {
    let mut ids = IdGenerator::new();
    assert_eq!(ids.generate_id("foo-1").0, "foo-1");
    assert_eq!(ids.generate_id("foo").0, "foo");
    assert_eq!(ids.generate_id("foo").0, "foo-2");
  }

  #[test]
  fn generate_id_never_repeats() {
    let mut ids = IdGenerator::new();
    let titles = ["a", "A", "a-1", "a", "a 1", "", "", "-"];
    let mut seen = HashSet::new();
    for title in titles {
      let (id, _) = ids.generate_id(title);
      assert!(seen.insert(id.clone()), "duplicate id {id:?}");
    }
  }
}
