//! Query service: embeds a question, finds the nearest corpus question and
//! runs its solution script. Also owns the index lifecycle and the HTTP surface.

pub mod error;
pub mod http;
pub mod lifecycle;
pub mod service;

pub use error::QueryError;
pub use http::{router, serve};
pub use lifecycle::{build_and_save, load_or_build, IndexSources};
pub use service::{Answer, QueryService, NO_MATCH_MESSAGE};
