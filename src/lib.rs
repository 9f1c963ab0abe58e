//! Tandem computes top-N recommendations from implicit `(user, item)` interactions with
//! item-based or user-based neighbourhood collaborative filtering, and evaluates them with
//! recall, precision, coverage and popularity on a held-out split.

pub mod config;
pub mod config_processors;
pub mod dataframeutils;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod knn;
pub mod logging;
pub mod metrics;
pub mod split;
pub mod stopwatch;

pub use crate::error::{CfError, Result};
