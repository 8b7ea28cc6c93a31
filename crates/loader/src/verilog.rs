//! Memory-image text for Verilog `$readmemh` or inline `initial` blocks.

use anyhow::{bail, Result};
use std::io::Write;
use switchport_core::memory::ProgramImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerilogStyle {
    /// One hex word per line, for `$readmemh`.
    Plain,
    /// `memory[i] = 32'h...;` assignments.
    Memory,
}

/// Writes the image as `bytes_per_word`-wide words starting at address 0,
/// one line per word.
///
/// Bytes within a word are taken in address order, most significant first.
/// Holes read as zero. An empty image writes nothing.
pub fn write_verilog<W: Write>(
    image: &ProgramImage,
    bytes_per_word: usize,
    style: VerilogStyle,
    out: &mut W,
) -> Result<()> {
    if !(1..=8).contains(&bytes_per_word) {
        bail!(
            "bytes_per_word must be between 1 and 8, got {}",
            bytes_per_word
        );
    }

    let mem = image.byte_map();
    let Some(max_addr) = mem.keys().next_back().copied() else {
        return Ok(());
    };

    let digits = bytes_per_word * 2;
    let bits = bytes_per_word * 8;
    let mut addr = Some(0u64);
    let mut index = 0usize;

    while let Some(base) = addr.filter(|a| *a <= max_addr) {
        let word = (0..bytes_per_word as u64).fold(0u64, |word, i| {
            let byte = base
                .checked_add(i)
                .and_then(|a| mem.get(&a))
                .copied()
                .unwrap_or(0);
            (word << 8) | byte as u64
        });
        match style {
            VerilogStyle::Plain => writeln!(out, "{:0digits$x}", word, digits = digits)?,
            VerilogStyle::Memory => writeln!(
                out,
                "memory[{}] = {}'h{:0digits$x};",
                index,
                bits,
                word,
                digits = digits
            )?,
        }
        addr = base.checked_add(bytes_per_word as u64);
        index += 1;
    }

    Ok(())
}
