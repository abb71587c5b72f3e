use crate::error::{Result, ShellError};
use crate::executor::fs_ops::resolve;
use crate::logging::Reporter;
use crate::ui::{create_spinner, fail_spinner};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::rc::Rc;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const ZIP_SUFFIX: &str = ".zip";
const TAR_SUFFIX: &str = ".tar.gz";

/// 아카이브 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Zip,
    TarGz,
}

impl Format {
    fn suffix(&self) -> &'static str {
        match self {
            Format::Zip => ZIP_SUFFIX,
            Format::TarGz => TAR_SUFFIX,
        }
    }
}

/// zip / unzip / tar / untar 구현
pub struct ArchiveCommands {
    reporter: Rc<Reporter>,
}

impl ArchiveCommands {
    pub fn new(reporter: Rc<Reporter>) -> Self {
        Self { reporter }
    }

    /// `zip <folder> <archive>`
    pub fn zip(&self, cwd: &Path, args: &[String]) -> Result<()> {
        let [folder, archive] = args else {
            return Err(ShellError::usage("Usage: zip <folder> <archive>"));
        };
        self.create(cwd, folder, archive, Format::Zip)
    }

    /// `unzip <archive>`
    pub fn unzip(&self, cwd: &Path, args: &[String]) -> Result<()> {
        let [archive] = args else {
            return Err(ShellError::usage("Usage: unzip <archive>"));
        };
        self.extract(cwd, archive, Format::Zip)
    }

    /// `tar <folder> <archive>` (gzip 압축)
    pub fn tar(&self, cwd: &Path, args: &[String]) -> Result<()> {
        let [folder, archive] = args else {
            return Err(ShellError::usage("Usage: tar <folder> <archive>"));
        };
        self.create(cwd, folder, archive, Format::TarGz)
    }

    /// `untar <archive>`
    pub fn untar(&self, cwd: &Path, args: &[String]) -> Result<()> {
        let [archive] = args else {
            return Err(ShellError::usage("Usage: untar <archive>"));
        };
        self.extract(cwd, archive, Format::TarGz)
    }

    fn create(&self, cwd: &Path, folder: &str, archive: &str, format: Format) -> Result<()> {
        let source = resolve(cwd, folder);
        if !source.is_dir() {
            return Err(ShellError::NotFound(folder.to_string()));
        }

        let archive = with_suffix(archive, format);
        let target = resolve(cwd, &archive);

        let spinner = create_spinner(&format!("Creating {}...", archive));
        let result = match format {
            Format::Zip => write_zip(&source, &target),
            Format::TarGz => write_tar_gz(&source, &target),
        };

        match result {
            Ok(()) => {
                spinner.finish_and_clear();
                self.reporter.say(&format!("Created: {}", archive));
                Ok(())
            }
            Err(e) => {
                fail_spinner(&spinner, &archive);
                Err(ShellError::io(format!("Cannot create {}", archive), e))
            }
        }
    }

    fn extract(&self, cwd: &Path, archive: &str, format: Format) -> Result<()> {
        let archive = with_suffix(archive, format);
        let source = resolve(cwd, &archive);
        if !source.is_file() {
            return Err(ShellError::NotFound(archive));
        }

        let extract_dir = &archive[..archive.len() - format.suffix().len()];
        let target = resolve(cwd, extract_dir);
        fs::create_dir_all(&target)
            .map_err(|e| ShellError::io(format!("Cannot create {}", extract_dir), e))?;

        let spinner = create_spinner(&format!("Extracting {}...", archive));
        let result = match format {
            Format::Zip => read_zip(&source, &target),
            Format::TarGz => read_tar_gz(&source, &target),
        };

        match result {
            Ok(()) => {
                spinner.finish_and_clear();
                self.reporter
                    .say(&format!("Extracted: {} to {}/", archive, extract_dir));
                Ok(())
            }
            Err(e) => {
                fail_spinner(&spinner, &archive);
                Err(ShellError::io(format!("Cannot extract {}", archive), e))
            }
        }
    }
}

fn with_suffix(archive: &str, format: Format) -> String {
    if archive.ends_with(format.suffix()) {
        archive.to_string()
    } else {
        format!("{}{}", archive, format.suffix())
    }
}

fn write_zip(source: &Path, target: &Path) -> io::Result<()> {
    let mut writer = ZipWriter::new(File::create(target)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        // zip 내부 경로는 항상 '/'
        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            writer.add_directory(name, options).map_err(zip_error)?;
        } else {
            writer.start_file(name, options).map_err(zip_error)?;
            io::copy(&mut File::open(entry.path())?, &mut writer)?;
        }
    }

    writer.finish().map_err(zip_error)?;
    Ok(())
}

fn read_zip(source: &Path, target: &Path) -> io::Result<()> {
    let mut archive = ZipArchive::new(File::open(source)?).map_err(zip_error)?;
    archive.extract(target).map_err(zip_error)
}

fn write_tar_gz(source: &Path, target: &Path) -> io::Result<()> {
    let encoder = GzEncoder::new(File::create(target)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(".", source)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

fn read_tar_gz(source: &Path, target: &Path) -> io::Result<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(source)?));
    archive.unpack(target)
}

fn zip_error(e: zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}
