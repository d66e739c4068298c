//! fedora-harvest: audit, harvest and maintain compound-object collections
//! in a Fedora repository over its REST API.
//!
//! All repository access flows through [`client::RepositoryClient`], a narrow
//! HTTP boundary the tests replace with a mock. [`cursor`] walks the
//! paginated search endpoint, [`relationships`] reconstructs compound-object
//! membership, [`versions`] manages datastream version retention and
//! [`audit`] cross-references the two into the "bad books" report. The
//! remaining modules are the operations the CLI exposes on top of those.

pub mod audit;
pub mod cli;
pub mod client;
pub mod config;
pub mod confirm;
pub mod cursor;
pub mod delete;
pub mod harvest;
pub mod labels;
pub mod load_config;
pub mod query;
pub mod reindex;
pub mod relationships;
pub mod versions;
pub mod xml;
