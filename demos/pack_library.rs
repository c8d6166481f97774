//! Packs every album under a download root into a Kavita-style library.
//!
//! Usage: `cargo run --example pack_library -- <source_dir> <output_dir> [compress_level]`
//!
//! Each album directory becomes `<output_dir>/<series>/<series>_cNNN.cbz`.
//! Existing archives are kept, so the example can be rerun after new
//! downloads land without repacking everything.

use comicpack::prelude::*;
use std::env;

#[tokio::main]
async fn main() -> comicpack::error::Result<()> {
    let args: Vec<String> = env::args().collect();
    let (source_dir, output_dir) = match args.as_slice() {
        [_, source, output, ..] => (PathBuf::from(source), PathBuf::from(output)),
        _ => {
            eprintln!("Usage: pack_library <source_dir> <output_dir> [compress_level]");
            return Ok(());
        }
    };
    let compress_level: u8 = match args.get(3) {
        Some(level) => level
            .parse()
            .map_err(|_| format!("Invalid compression level: {}", level))?,
        None => 1,
    };

    let packer = Packer::builder()
        .overwrite(false)
        .compress_level(compress_level)
        .build()?;

    println!("=== Packing {} ===\n", source_dir.display());

    let stats = packer.pack_many(&source_dir, &output_dir).await;

    println!("Albums:    {}", stats.total);
    println!("Packed:    {}", stats.success);
    println!("Failed:    {}", stats.failed);
    println!("Output:    {}", output_dir.display());

    Ok(())
}
