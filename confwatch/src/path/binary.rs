//! Extension-based detection of binary files.
//!
//! Content is never inspected: a file counts as binary when its extension
//! is one of the well-known binary formats below.

use std::path::Path;

/// Known binary file extensions, lowercase, without the dot. Sorted so the
/// table can be binary-searched.
const BINARY_EXTENSIONS: &[&str] = &[
    "3dm", "3ds", "3g2", "3gp", "7z", "a", "aac", "adp", "ai", "aif", "aiff", "alz", "ape", "apk",
    "appimage", "ar", "arj", "asf", "au", "avi", "bak", "baml", "bh", "bin", "bk", "bmp", "btif",
    "bz2", "bzip2", "cab", "caf", "cgm", "class", "cmx", "cpio", "cr2", "cur", "dat", "dcm", "deb",
    "dex", "djvu", "dll", "dmg", "dng", "doc", "docm", "docx", "dot", "dotm", "dra", "ds_store",
    "dsk", "dts", "dtshd", "dvb", "dwg", "dxf", "ecelp4800", "ecelp7470", "ecelp9600", "egg",
    "eol", "eot", "epub", "exe", "f4v", "fbs", "fh", "fla", "flac", "flatpak", "fli", "flv", "fpx",
    "fst", "fvt", "g3", "gh", "gif", "graffle", "gz", "gzip", "h261", "h263", "h264", "icns",
    "ico", "ief", "img", "ipa", "iso", "jar", "jpeg", "jpg", "jpgv", "jpm", "jxr", "key", "ktx",
    "lha", "lib", "lvp", "lz", "lzh", "lzma", "lzo", "m3u", "m4a", "m4v", "mar", "mdi", "mht",
    "mid", "midi", "mj2", "mka", "mkv", "mmr", "mng", "mobi", "mov", "movie", "mp3", "mp4", "mp4a",
    "mpeg", "mpg", "mpga", "mxu", "nef", "npx", "numbers", "nupkg", "o", "odp", "ods", "odt",
    "oga", "ogg", "ogv", "otf", "ott", "pages", "pbm", "pcx", "pdb", "pdf", "pea", "pgm", "pic",
    "png", "pnm", "pot", "potm", "potx", "ppa", "ppam", "ppm", "pps", "ppsm", "ppsx", "ppt",
    "pptm", "pptx", "psd", "pya", "pyc", "pyo", "pyv", "qt", "rar", "ras", "raw", "resources",
    "rgb", "riff", "rip", "rlc", "rmf", "rmvb", "rpm", "rtf", "rz", "s3m", "s7z", "scpt", "sgi",
    "shar", "sil", "sketch", "slk", "smv", "snap", "snk", "so", "stl", "sub", "suo", "swf", "tar",
    "tbz", "tbz2", "tga", "tgz", "thmx", "tif", "tiff", "tlz", "ttc", "ttf", "txz", "udf", "uvh",
    "uvi", "uvm", "uvp", "uvs", "uvu", "viv", "vob", "war", "wav", "wax", "wbmp", "wdp", "weba",
    "webm", "webp", "whl", "wim", "wm", "wma", "wmv", "wmx", "woff", "woff2", "wrm", "wvx", "xbm",
    "xif", "xla", "xlam", "xls", "xlsb", "xlsm", "xlsx", "xlt", "xltm", "xltx", "xm", "xmind",
    "xpi", "xpm", "xwd", "xz", "z", "zip", "zipx",
];

/// Whether a path names a binary file, judged by its extension.
///
/// # Examples
///
/// ```
/// use confwatch::path::is_binary_path;
/// use std::path::Path;
///
/// assert!(is_binary_path(Path::new("logo.PNG")));
/// assert!(!is_binary_path(Path::new("app.json")));
/// assert!(!is_binary_path(Path::new("Makefile")));
/// ```
#[must_use]
pub fn is_binary_path(path: &Path) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = ext.to_string_lossy().to_ascii_lowercase();
    BINARY_EXTENSIONS.binary_search(&ext.as_str()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        assert!(BINARY_EXTENSIONS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_config_formats_are_text() {
        for name in ["a.json", "a.jsonc", "a.ini", "a.yaml", "a.yml", "a.toml", "a.xml", "a.js", "a.txt"] {
            assert!(!is_binary_path(Path::new(name)), "{name} flagged as binary");
        }
    }

    #[test]
    fn test_archives_and_images_are_binary() {
        for name in ["backup.tar", "archive.zip", "photo.jpeg", "font.woff2", "lib.so"] {
            assert!(is_binary_path(Path::new(name)), "{name} not flagged as binary");
        }
    }
}
