use std::{env, fs::File, io::Read, process};

use jpegmeta::{color::D50, file::SegmentReader};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    let (path, segments) = match &*env::args().skip(1).collect::<Vec<_>>() {
        [path] => (path.clone(), false),
        [flag, path] if flag == "--segments" => (path.clone(), true),
        _ => {
            eprintln!("usage: dump [--segments] <file.jpeg>");
            process::exit(1);
        }
    };

    let (metadata, mut image) = jpegmeta::load(File::open(&path)?);

    match metadata {
        Ok(metadata) => {
            println!(
                "{}x{}, {} bits per component",
                metadata.pixel_width(),
                metadata.pixel_height(),
                metadata.bits_per_component(),
            );
            if let Some(profile) = metadata.color_profile() {
                let header = profile.header();
                println!(
                    "ICC profile: {} bytes, v{}.{}, {:?} {:?} -> {:?}",
                    profile.data().len(),
                    header.version.major,
                    header.version.minor,
                    header.device_class,
                    header.color_space,
                    header.pcs,
                );
                if let Some(desc) = profile.description() {
                    println!("  description: {desc}");
                }
                if let Some(white) = profile.media_white_point() {
                    let lab = white.to_lab(D50);
                    println!(
                        "  media white point: XYZ({:.4}, {:.4}, {:.4}) Lab({:.2}, {:.2}, {:.2})",
                        white.x, white.y, white.z, lab.l, lab.a, lab.b,
                    );
                }
            }
            if let Some(e) = metadata.color_profile_error() {
                println!("ICC profile unusable: {e}");
            }
        }
        Err(e) => println!("no metadata: {e}"),
    }

    // The replayed stream still contains the whole file.
    let mut jpeg = Vec::new();
    image.read_to_end(&mut jpeg)?;
    println!("{} bytes total", jpeg.len());

    if segments {
        let mut reader = SegmentReader::new(&jpeg[..]);
        while let Some(segment) = reader.next_segment()? {
            println!(
                "{:08X} {:?} ({} bytes)",
                segment.offset(),
                segment.marker(),
                segment.data().len()
            );
            if segment.marker() == jpegmeta::file::Marker::SOS {
                break;
            }
        }
    }

    Ok(())
}
