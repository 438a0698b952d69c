#![allow(clippy::expect_used, clippy::panic, reason = "Fine in tests")]
use stitchmd_core::{MemoryReader, StitchError, StitchOptions, Stitcher};

fn stitch(reader: &MemoryReader, summary: &str, options: StitchOptions) -> String {
  Stitcher::new(options)
    .stitch_to_string(reader, "summary.md", summary)
    .expect("stitch")
}

fn stitch_err(reader: &MemoryReader, summary: &str) -> StitchError {
  Stitcher::new(StitchOptions {
    embed_stack: vec!["summary.md".to_owned()],
    ..StitchOptions::default()
  })
  .stitch_to_string(reader, "summary.md", summary)
  .expect_err("stitching should fail")
}

fn no_toc() -> StitchOptions {
  StitchOptions {
    no_toc: true,
    ..StitchOptions::default()
  }
}

/// Level of the ATX heading whose text is exactly `title`.
fn heading_level(out: &str, title: &str) -> Option<usize> {
  out.lines().find_map(|line| {
    let text = line.trim_start_matches('#');
    let level = line.len() - text.len();
    (level > 0 && text.strip_prefix(' ') == Some(title)).then_some(level)
  })
}

#[test]
fn sibling_files() {
  let reader = MemoryReader::new()
    .with_file("foo.md", "# Foo\nhello\n")
    .with_file("bar.md", "# Bar\nworld\n");
  let summary = "- [foo](foo.md)\n- [bar](bar.md)\n";

  assert_eq!(
    stitch(&reader, summary, StitchOptions::default()),
    "- [foo](#foo)\n- [bar](#bar)\n\n# Foo\n\nhello\n\n# Bar\n\nworld\n"
  );
  assert_eq!(
    stitch(&reader, summary, no_toc()),
    "# Foo\n\nhello\n\n# Bar\n\nworld\n"
  );
}

#[test]
fn single_file_round_trips() {
  let body = "# Foo\n\nSome *text* with `code`.\n\n- one\n- two\n\n```sh\necho hi\n```\n\n> quoted\n";
  let reader = MemoryReader::new().with_file("foo.md", body);
  assert_eq!(stitch(&reader, "- [Foo](foo.md)\n", no_toc()), body);
}

#[test]
fn nested_group() {
  let reader = MemoryReader::new().with_file("foo.md", "# Foo\n\n## Bar\n\ntext\n");
  let out = stitch(
    &reader,
    "- Section Label\n    - [foo](foo.md)\n",
    StitchOptions::default(),
  );

  assert!(out.starts_with("- [Section Label](#section-label)\n"), "{out}");
  assert!(out.contains("- [foo](#foo)"), "{out}");
  assert!(
    out.ends_with("\n\n# Section Label\n\n## Foo\n\n### Bar\n\ntext\n"),
    "{out}"
  );
}

#[test]
fn heading_levels_follow_title_depth_and_file_level() {
  let file = "# F\n\n## K2\n\n### K3\n\n#### K4\n";
  let reader = MemoryReader::new().with_file("f.md", file);

  for title_level in 0..=3_usize {
    for depth in 0..=2_usize {
      let mut summary = String::new();
      if title_level > 0 {
        summary.push_str(&format!("{} Guide\n\n", "#".repeat(title_level)));
      }
      for d in 0..depth {
        summary.push_str(&format!("{}- Group {d}\n", "    ".repeat(d)));
      }
      summary.push_str(&format!("{}- [F](f.md)\n", "    ".repeat(depth)));

      let out = stitch(&reader, &summary, no_toc());
      for (k, title) in [(1, "F"), (2, "K2"), (3, "K3"), (4, "K4")] {
        let level = title_level + depth + k;
        let case = format!("title level {title_level}, depth {depth}, {title}:\n{out}");
        if level <= 6 {
          assert_eq!(heading_level(&out, title), Some(level), "{case}");
        } else {
          assert_eq!(heading_level(&out, title), None, "{case}");
          let id = title.to_lowercase();
          assert!(
            out.contains(&format!("<a id=\"{id}\"></a> **{title}**")),
            "{case}"
          );
        }
      }
    }
  }
}

#[test]
fn fragments_follow_renamed_headings() {
  let reader = MemoryReader::new()
    .with_file(
      "a.md",
      "# A\n\n## Alpha\n\n[1](b.md#alpha) [2](b.md#beta) [3](b.md#gamma) [4](b.md)\n",
    )
    .with_file("b.md", "# B\n\n## Alpha\n\n## Beta\n");
  let out = stitch(&reader, "- [A](a.md)\n- [B](b.md)\n", no_toc());

  assert!(out.contains("[1](#alpha-1)"), "{out}");
  assert!(out.contains("[2](#beta)"), "{out}");
  assert!(out.contains("[3](#gamma)"), "{out}");
  assert!(out.contains("[4](#b)"), "{out}");
}

#[test]
fn same_file_fragments_are_not_remapped() {
  let reader = MemoryReader::new()
    .with_file("a.md", "# A\n\n## Usage\n")
    .with_file("b.md", "# B\n\n## Usage\n\nSee [usage](#usage).\n");
  let out = stitch(&reader, "- [A](a.md)\n- [B](b.md)\n", no_toc());

  // B's heading is now #usage-1, but the bare fragment still says #usage.
  assert!(out.contains("See [usage](#usage)."), "{out}");
}

#[test]
fn links_outside_the_collection_follow_the_output() {
  let reader = MemoryReader::new().with_file(
    "guide/a.md",
    "# A\n\n![logo](../img/logo.png) [license](../LICENSE)\n",
  );
  let out = stitch(&reader, "- [A](guide/a.md)\n", StitchOptions {
    no_toc: true,
    input_rel_path: "../docs".to_owned(),
    ..StitchOptions::default()
  });
  assert!(out.contains("![logo](../docs/img/logo.png)"), "{out}");
  assert!(out.contains("[license](../docs/LICENSE)"), "{out}");
}

#[test]
fn absorb_splices_headings_into_toc() {
  let reader = MemoryReader::new()
    .with_file("a.md", "---\nabsorb: true\n---\n\n# A\n\n## One\n\n## Two\n")
    .with_file("b.md", "# B\n");
  let out = stitch(&reader, "- [A](a.md)\n- [B](b.md)\n", StitchOptions::default());

  let toc: Vec<_> = out
    .lines()
    .take_while(|l| !l.starts_with('#'))
    .filter(|l| !l.trim().is_empty())
    .collect();
  assert_eq!(toc, [
    "- [A](#a)",
    "  - [One](#one)",
    "  - [Two](#two)",
    "- [B](#b)",
  ]);
  assert!(!out.contains("absorb"), "front matter leaked: {out}");
}

#[test]
fn embedded_summary() {
  let reader = MemoryReader::new()
    .with_file("intro.md", "# Intro\n\nWelcome.\n")
    .with_file(
      "api/summary.md",
      "# API Reference\n\n- [Client](client.md)\n- [Server](server.md)\n",
    )
    .with_file("api/client.md", "# Client\n\nSee [server](server.md#setup).\n")
    .with_file("api/server.md", "# Server\n\n## Setup\n\nSteps.\n");
  let summary = "# Guide\n\n- [Intro](intro.md)\n- ![API](api/summary.md)\n";

  assert_eq!(
    stitch(&reader, summary, no_toc()),
    "# Guide\n\n## Intro\n\nWelcome.\n\n## API Reference\n\n### Client\n\nSee \
     [server](#setup).\n\n### Server\n\n#### Setup\n\nSteps.\n"
  );

  let out = stitch(&reader, summary, StitchOptions::default());
  assert!(out.contains("- [API](#api-reference)"), "{out}");
  assert!(
    out
      .lines()
      .any(|l| l.starts_with(' ') && l.trim_start() == "- [Server](#server)"),
    "{out}"
  );
}

#[test]
fn embed_cycle() {
  let reader = MemoryReader::new()
    .with_file("summary.md", "- ![B](b/summary.md)\n")
    .with_file("b/summary.md", "- ![A](../summary.md)\n");
  let err = stitch_err(&reader, "- ![B](b/summary.md)\n");

  assert!(matches!(err, StitchError::Collect(_)));
  assert!(
    err
      .to_string()
      .contains("embed cycle: summary.md -> b/summary.md -> summary.md"),
    "{err}"
  );
}

#[test]
fn embed_with_extra_section() {
  let reader = MemoryReader::new()
    .with_file("other.md", "- [a](a.md)\n\n## More\n\n- [b](b.md)\n")
    .with_file("a.md", "a\n")
    .with_file("b.md", "b\n");
  let err = stitch_err(&reader, "- [x](x.md)\n- ![Other](other.md)\n");

  // Only the embed error and the missing file, each at its own entry.
  let lines: Vec<_> = err.diagnostics().expect("diagnostics").iter().map(ToString::to_string).collect();
  assert_eq!(lines, [
    "summary.md:1:3:open x.md: file does not exist",
    "summary.md:2:3:other.md:3:1:unexpected section; expected only one section",
  ]);
}

#[test]
fn embed_without_sections() {
  let reader = MemoryReader::new().with_file("empty.md", "");
  let err = stitch_err(&reader, "- ![Empty](empty.md)\n");
  assert_eq!(
    err.to_string(),
    "error reading markdown\nsummary.md:1:3:empty.md:1:1:no sections found"
  );
}

#[test]
fn external_link_with_children() {
  let reader = MemoryReader::new().with_file("a.md", "a\n");
  let err = stitch_err(&reader, "- [Site](https://example.com)\n    - [a](a.md)\n");
  assert_eq!(
    err.to_string(),
    "error reading markdown\nsummary.md:1:3:external link cannot have children"
  );
}
