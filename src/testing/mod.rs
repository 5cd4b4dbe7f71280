//! Testing utilities for SheetScan
//!
//! Provides synthetic answer-sheet frames painted at the positions of the
//! standard sheet layout, enabling offline testing without a camera or
//! printed sheets.

pub mod synthetic_data;

pub use synthetic_data::{blank_page, paint_disk, SheetBuilder};
