//! Query model: normalized params, client-side refinement, and page
//! accumulation. Everything here is synchronous and side-effect free; the
//! async plumbing lives in `crate::pipeline`.

mod page;
mod params;
mod refine;

pub use page::{MergeMode, PageAccumulator};
pub use params::{QueryParams, SortKey};
pub use refine::{filter_movies, refine, sort_movies};
