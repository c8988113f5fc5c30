//! Nintendo ROM and disc image readers.
//!
//! This crate provides thumbnail sources for:
//!
//! - Nintendo DS (internal icon, GameTDB box/cover scans)
//! - GameCube and Wii (GameTDB disc/cover scans)

pub(crate) mod gametdb;
pub mod ds;
pub mod gamecube;

pub use ds::NintendoDsReader;
pub use gamecube::GameCubeReader;
