//! Infrastructure layer: persistence for users and notes.
//!
//! Storage is consumed through the narrow [`UserStore`] and [`NoteStore`]
//! traits. In-memory implementations back tests and single-process dev runs;
//! the PostgreSQL implementations back real deployments.

pub mod db;
pub mod store;

pub use store::{
    InMemoryNoteStore, InMemoryUserStore, NoteStore, PostgresNoteStore, PostgresUserStore,
    StoreError, UserStore,
};
