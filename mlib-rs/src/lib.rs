//! # mlib-rs
//!
//! `mlib-rs` is a pure Rust reader for the `.Lib` sprite libraries used by Legend of Mir 2 clients.
//! A library holds many gzip compressed BGRA images, each addressed by an offset index,
//! plus an optional table of animation frames.
//!
//! ## Features
//! - Read library versions 2 and 3 (with frame table)
//! - Random access to image records, headers read lazily and cached
//! - Decode pixel and mask layers on demand
//! - Copy decoded images onto RGBA canvases, individually or as a grid atlas
//! - Discover the numbered libraries of a data directory
//!
//! Encoding canvases to PNG or BMP is left to the caller.
//!
//! ### Example: Building an atlas
//! ```rust,no_run
//! use mlib_rs::{atlas::GridLayout, library::Library};
//!
//! let mut tiles = Library::open("Data/Map/Tiles.Lib");
//! tiles.initialize().unwrap();
//!
//! let atlas = tiles.build_atlas(&GridLayout::default()).unwrap();
//! println!("{}x{} RGBA", atlas.width(), atlas.height());
//! ```

pub mod atlas;
pub mod error;
mod ext;
pub mod frame;
pub mod image_record;
pub mod library;
pub mod library_header;
pub mod library_set;
pub mod shadow_flags;
