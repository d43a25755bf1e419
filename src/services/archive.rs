use crate::domain::constants::ZSTD_WINDOW_LOG_MAX;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub trait Archiver {
    /// Unpacks a tar archive (plain or gzip) into `dest`.
    fn unpack(&self, archive: &Path, dest: &Path) -> anyhow::Result<()>;

    /// Decompresses one zstd stream from `src` into a new file at `dest`.
    fn decompress_zstd(&self, src: &Path, dest: &Path) -> anyhow::Result<()>;
}

pub struct NativeArchiver;

fn is_gzip(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    name.ends_with(".gz") || name.ends_with(".tgz")
}

impl Archiver for NativeArchiver {
    fn unpack(&self, archive: &Path, dest: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dest)?;
        let file = BufReader::new(File::open(archive)?);
        let reader: Box<dyn Read> = if is_gzip(archive) {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let mut tar = tar::Archive::new(reader);
        tar.set_preserve_permissions(true);
        tar.unpack(dest)
            .map_err(|e| anyhow::anyhow!("unpacking {}: {}", archive.display(), e))?;
        Ok(())
    }

    fn decompress_zstd(&self, src: &Path, dest: &Path) -> anyhow::Result<()> {
        let mut decoder = zstd::stream::read::Decoder::new(BufReader::new(File::open(src)?))?;
        decoder.window_log_max(ZSTD_WINDOW_LOG_MAX)?;

        let mut out = BufWriter::new(File::options().write(true).create_new(true).open(dest)?);
        let copied = std::io::copy(&mut decoder, &mut out).and_then(|_| out.flush());
        if let Err(e) = copied {
            drop(out);
            let _ = std::fs::remove_file(dest);
            return Err(e.into());
        }
        Ok(())
    }
}
