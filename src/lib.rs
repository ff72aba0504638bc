//! The library code for the `spacetraveling` blog generator. A build breaks
//! down into two steps:
//!
//! 1. Fetching posts from the headless CMS ([`crate::prismic`]) through the
//!    static generation hooks ([`crate::hooks`])
//! 2. Converting the posts into output files on disk ([`crate::write`])
//!
//! Between the two sit the view models. The listing ([`crate::listing`])
//! holds the posts displayed so far and follows the CMS's continuation cursor
//! to load more; each listing page on disk is a snapshot after one more round
//! of loading. The article view ([`crate::article`]) renders a post's rich
//! text ([`crate::htmlrenderer`]), formats its dates ([`crate::date`]),
//! estimates its reading time ([`crate::reading_time`]), and links its
//! neighbours.
//!
//! [`crate::build::build_site`] stitches the steps together and also writes
//! the Atom feed and copies static assets.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod build;
pub mod comments;
pub mod config;
pub mod date;
pub mod feed;
pub mod hooks;
pub mod htmlrenderer;
pub mod listing;
pub mod post;
pub mod prismic;
pub mod reading_time;
pub mod richtext;
pub mod telemetry;
pub mod write;

#[cfg(test)]
mod testing;
