// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for cell count export formats
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod cell_counts;

pub use cell_counts::{CellCountParseError, CellCountParser, CellCountTables};
