//! # stitchmd-core - Stitch many Markdown files into one
//!
//! A summary document lists the files to combine as a nested Markdown list.
//! Stitching loads every listed file, shifts its headings to match its place
//! in the list, rewrites links between the files into in-document anchors,
//! and renders everything back out as a single Markdown document.
//!
//! ## Quick Start
//!
//! ```rust
//! use stitchmd_core::{MemoryReader, StitchOptions, Stitcher};
//!
//! let reader = MemoryReader::new()
//!   .with_file("install.md", "# Install\n\nRun the installer.\n")
//!   .with_file("usage.md", "# Usage\n\nSee [install](install.md).\n");
//!
//! let summary = "# User Guide\n\n- [Install](install.md)\n- [Usage](usage.md)\n";
//! let stitcher = Stitcher::new(StitchOptions::default());
//! let out = stitcher
//!   .stitch_to_string(&reader, "summary.md", summary)
//!   .expect("stitching succeeds");
//!
//! assert!(out.contains("## Install"));
//! assert!(out.contains("See [install](#install)."));
//! ```
//!
//! ## Summary format
//!
//! - `[Title](file.md)` includes a file.
//! - `![Title](other/summary.md)` embeds the only section of another summary.
//! - Plain text groups the nested entries under a heading of its own.
//! - `[Title](https://...)` stays in the table of contents only.
//!
//! A file whose front matter sets `absorb: true` has its own heading outline
//! spliced into the table of contents.

pub mod collect;
pub mod error;
pub mod frontmatter;
pub mod fs;
pub mod generate;
pub mod header;
pub mod markdown;
pub mod paths;
pub mod pos;
pub mod rawhtml;
pub mod reference;
pub mod stitch;
pub mod summary;
pub mod toc;
pub mod transform;
pub mod tree;

pub use crate::{
  error::{FsError, RenderError, Result, StitchError},
  fs::{DirReader, FileReader, MemoryReader},
  markdown::{CommonMarkRenderer, Renderer},
  pos::{Diagnostic, Diagnostics},
  stitch::{StitchOptions, Stitcher, stitch},
};
