//! I/O modules for talking to the remote data archive

pub mod archive;

pub use archive::{Collection, Credentials, DataStore, RemoteProduct};
