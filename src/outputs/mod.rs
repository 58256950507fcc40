//! Output generation modules for blog pages, listings and PDF reports.
//!
//! # Submodules
//!
//! - [`post`]: Renders a queued entry into a standalone HTML post
//! - [`indexes`]: Refreshes the blog archive and the home page listings
//! - [`pdf`]: Lays out and renders PDF reports
//!
//! # Output Structure
//!
//! ```text
//! root/
//! ├── index.html              # home, latest posts block
//! ├── blog/
//! │   ├── index.html          # archive, one card per post
//! │   └── regla-1-1-1.html
//! ├── downloads/
//! │   └── guia-ahorro.pdf     # PDF queue jobs
//! └── site/
//!     ├── action_report.pdf
//!     └── system_report.pdf
//! ```

pub mod indexes;
pub mod pdf;
pub mod post;
