use camino::Utf8Path;
use simple_error::{SimpleResult, bail};

/// Check a required input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_required_filename(filename: &Utf8Path, label: &str) -> SimpleResult<()> {
    if filename.as_str().is_empty() {
        bail!("Must specify {} file", label);
    }
    if !filename.exists() {
        bail!("Can't find specified {} file: '{}'", label, filename);
    }
    if !filename.is_file() {
        bail!(
            "Specified {} file path does not appear to be a file: '{}'",
            label,
            filename
        );
    }
    Ok(())
}

/// Check that the directory of an output file exists
///
pub fn check_output_filename_dir(filename: &Utf8Path, label: &str) -> SimpleResult<()> {
    if filename.is_dir() {
        bail!("Specified {} file path is a directory: '{}'", label, filename);
    }
    if let Some(parent) = filename.parent()
        && !parent.as_str().is_empty()
        && !parent.is_dir()
    {
        bail!(
            "Directory for {} file does not exist: '{}'",
            label,
            parent
        );
    }
    Ok(())
}
