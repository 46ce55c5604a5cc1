pub mod archive;
pub mod cache;
pub mod download;
pub mod filter;
pub mod locations;
pub mod upstream;
