//! Storage for uploaded post images.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::offset::Utc;

use crate::{Error, Result};

/// Validate an uploaded image and store it in the media dir.
///
/// The payload has to decode as an image end to end, so an archive renamed
/// to `.jpg` doesn't get past this. Returns the media path the post should
/// reference, relative to `upload_dir`.
pub fn store_image<P>(data: &[u8], upload_dir: P) -> Result<String>
where
    P: AsRef<Path>,
{
    let format = image::guess_format(data).map_err(|_| Error::ImageInvalid)?;
    image::load_from_memory_with_format(data, format)
        .map_err(|_| Error::ImageInvalid)?;

    let ext = format.extensions_str().first().copied().unwrap_or("img");

    let posts_dir = upload_dir.as_ref().join("posts");
    fs::create_dir_all(&posts_dir).map_err(|err| {
        Error::from_io_error(
            err,
            format!("Couldn't create media dir {}", posts_dir.display()),
        )
    })?;

    let epoch = Utc::now().format("%s").to_string();
    let mut num = 0;
    let mut suffix = String::new();

    // Loop until we generate a filename that isn't already taken.
    let mut save_name: String;
    let mut save_path: PathBuf;
    loop {
        save_name = format!("{}{}.{}", epoch, suffix, ext);
        save_path = posts_dir.join(&save_name);

        if !save_path.exists() {
            break;
        }

        num += 1;
        suffix = format!("-{}", num);
    }

    fs::write(&save_path, data).map_err(|err| {
        Error::from_io_error(
            err,
            format!("Couldn't write upload file {}", save_path.display()),
        )
    })?;

    Ok(format!("posts/{}", save_name))
}
