//! Bus Address Decomposition.
//!
//! A bus address is partitioned into three fixed-width fields:
//! bank (selects an independent bank state), row (the resident row within
//! that bank), and column (the word offset within the row). Every component
//! sharing an address space must be built from the same `AddressMap` so the
//! field boundaries agree.

/// Field widths and accessors for the bank/row/column address split.
///
/// The widths are configuration constants fixed at construction; the
/// default geometry is 2/15/10 bits (4 banks, 32768 rows per bank,
/// 1024 words per row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMap {
    bank_bits: u32,
    row_bits: u32,
    col_bits: u32,
}

impl AddressMap {
    /// Creates an address map with the given field widths.
    ///
    /// The combined width must fit a 32-bit address.
    pub fn new(bank_bits: u32, row_bits: u32, col_bits: u32) -> Self {
        assert!(
            bank_bits + row_bits + col_bits <= 32,
            "address fields exceed 32 bits"
        );
        Self {
            bank_bits,
            row_bits,
            col_bits,
        }
    }

    /// Number of banks addressable by this map.
    pub fn banks(&self) -> u32 {
        1 << self.bank_bits
    }

    /// Number of rows per bank.
    pub fn rows(&self) -> u32 {
        1 << self.row_bits
    }

    /// Number of word columns per row.
    pub fn cols(&self) -> u32 {
        1 << self.col_bits
    }

    /// Extracts the bank field from an address.
    pub fn bank(&self, addr: u32) -> u32 {
        (addr >> (self.row_bits + self.col_bits)) & (self.banks() - 1)
    }

    /// Extracts the row field from an address.
    pub fn row(&self, addr: u32) -> u32 {
        (addr >> self.col_bits) & (self.rows() - 1)
    }

    /// Extracts the column field from an address.
    pub fn col(&self, addr: u32) -> u32 {
        addr & (self.cols() - 1)
    }

    /// Composes an address from its bank, row, and column fields.
    pub fn compose(&self, bank: u32, row: u32, col: u32) -> u32 {
        (bank << (self.row_bits + self.col_bits)) | (row << self.col_bits) | col
    }
}

impl Default for AddressMap {
    fn default() -> Self {
        Self::new(2, 15, 10)
    }
}
