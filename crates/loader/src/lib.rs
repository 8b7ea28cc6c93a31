use anyhow::{anyhow, Context, Result};
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;
use std::fs;
use std::path::Path;
use switchport_core::memory::ProgramImage;
use tracing::{debug, info, warn};

pub mod ihex;
pub mod verilog;

pub use ihex::{parse_ihex, HexError};
pub use verilog::{write_verilog, VerilogStyle};

pub fn load_elf(path: &Path) -> Result<ProgramImage> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;

    let elf = Elf::parse(&buffer).context("Failed to parse ELF binary")?;

    info!("ELF Entry Point: {:#x}", elf.entry);

    let mut program_image = ProgramImage::new(elf.entry);

    for ph in elf.program_headers {
        if ph.p_type == PT_LOAD {
            // Physical address (LMA) is where the bytes live in the memory image
            let start_addr = ph.p_paddr;
            let size = ph.p_filesz as usize;
            let offset = ph.p_offset as usize;

            if size == 0 {
                continue;
            }

            debug!(
                "Found Loadable Segment: Addr={:#x}, Size={} bytes, Offset={:#x}",
                start_addr, size, offset
            );

            if offset + size > buffer.len() {
                return Err(anyhow!("Segment out of bounds in ELF file"));
            }

            program_image.add_segment(start_addr, buffer[offset..offset + size].to_vec());
        }
    }

    if program_image.segments.is_empty() {
        warn!("No loadable segments found in ELF file");
    }

    Ok(program_image)
}

pub fn load_ihex(path: &Path) -> Result<ProgramImage> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read Intel HEX file: {:?}", path))?;
    let image = parse_ihex(&text).with_context(|| format!("Failed to parse {:?}", path))?;
    info!(
        "Intel HEX: {} data records, highest address {:?}",
        image.segments.len(),
        image.highest_address()
    );
    Ok(image)
}

/// Loads `.hex`/`.ihex` files as Intel HEX and anything else as ELF.
pub fn load_image(path: &Path) -> Result<ProgramImage> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("hex") || ext.eq_ignore_ascii_case("ihex") => {
            load_ihex(path)
        }
        _ => load_elf(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Little-endian ELF32 (ARM) with a `.text` PT_LOAD at LMA 0 and a
    /// `.bss` PT_LOAD that carries no file bytes.
    fn thumb_elf(text_filesz: u32) -> Vec<u8> {
        let mut elf = vec![0x7f, b'E', b'L', b'F', 1, 1, 1, 0];
        elf.extend_from_slice(&[0; 8]);
        for half in [2u16, 40] {
            elf.extend_from_slice(&half.to_le_bytes());
        }
        for word in [1u32, 0x101, 52, 0, 0x0500_0200] {
            elf.extend_from_slice(&word.to_le_bytes());
        }
        for half in [52u16, 32, 2, 40, 0, 0] {
            elf.extend_from_slice(&half.to_le_bytes());
        }
        let text = [PT_LOAD, 116, 0x2000_0000, 0, text_filesz, 8, 5, 4];
        let bss = [PT_LOAD, 0, 0x2000_0000, 0x2000_0000, 0, 0x100, 6, 4];
        for word in text.into_iter().chain(bss) {
            elf.extend_from_slice(&word.to_le_bytes());
        }
        assert_eq!(elf.len(), 116);
        elf.extend_from_slice(&[0x00, 0x01, 0x00, 0x20, 0x41, 0x00, 0x00, 0x00]);
        elf
    }

    #[test]
    fn test_load_ihex_from_disk() {
        let mut path = std::env::temp_dir();
        path.push(format!("switchport-loader-{}.hex", std::process::id()));
        fs::write(&path, ":0400000001020304F2\n:00000001FF\n").unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.segments.len(), 1);
        assert_eq!(image.segments[0].data, vec![1, 2, 3, 4]);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let err = load_image(Path::new("does/not/exist.hex")).unwrap_err();
        assert!(err.to_string().contains("Failed to read Intel HEX file"));

        let err = load_image(Path::new("does/not/exist.elf")).unwrap_err();
        assert!(err.to_string().contains("Failed to read ELF file"));
    }

    #[test]
    fn test_garbage_elf() {
        let mut path = std::env::temp_dir();
        path.push(format!("switchport-loader-{}.elf", std::process::id()));
        fs::write(&path, b"not an elf").unwrap();

        assert!(load_elf(&path).is_err());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_elf_segments_at_lma() {
        let mut path = std::env::temp_dir();
        path.push(format!("switchport-loader-{}-ok.elf", std::process::id()));
        fs::write(&path, thumb_elf(8)).unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.entry_point, 0x101);
        assert_eq!(image.segments.len(), 1);
        assert_eq!(image.segments[0].start_addr, 0);
        assert_eq!(
            image.segments[0].data,
            vec![0x00, 0x01, 0x00, 0x20, 0x41, 0x00, 0x00, 0x00]
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_elf_segment_past_end_of_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("switchport-loader-{}-short.elf", std::process::id()));
        fs::write(&path, thumb_elf(0x100)).unwrap();

        let err = load_elf(&path).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));

        let _ = fs::remove_file(&path);
    }
}
