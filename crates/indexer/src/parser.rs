use regex::Regex;
use std::sync::LazyLock;

/// Title, season and episode recovered from a video path.
///
/// Season 0 means no series markers were found anywhere in the path; the
/// video handler treats such files as movies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFileInfo {
    pub title: String,
    pub season: u32,
    pub episode: u32,
}

// Release tags that end the usable part of a filename. Everything from the
// first tag onwards is discarded before title extraction.
static TITLE_SPLIT_KEYWORDS: &[&str] = &[
    "[", "]", "~", "(", ")", "dvdscr", "dvdrip", "dvd-rip", "dvdr", "vcd", "divx", "xvid", "ac3",
    "r5", "pal", "readnfo", "uncut", "cd1", "cd2", "dvdiso",
];

// `Show/Season 2/05 something.avi` layout
static RE_PATH_SEASON_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<title>.*?)/[a-z]+\s+(?P<season>\d{1,2})/(?P<episode>\d{1,2})").unwrap()
});

// `Show - Season 2/05 something.avi` layout
static RE_PATH_DASHED_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<title>.*?)\s*?(/|-)\s*[a-z]+\s+(?P<season>\d{1,2})/(?P<episode>\d{1,2})")
        .unwrap()
});

// s02e05 / 2x05 / 2xe05 markers in the filename
static RE_FILE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<title>.*?)s?(?P<season>\d{1,2})(x|e|xe)(?P<episode>\d{1,2})").unwrap()
});

// Spelled-out `season 2 episode 5`
static RE_FILE_SPELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<title>.*?)season\s(?P<season>\d{1,2})\sepisode\s(?P<episode>\d{1,2})")
        .unwrap()
});

/// Strip the extension and release tags from a filename, leaving the part
/// that can carry a title. Separators become spaces first, so tags like
/// `dvd.rip` still match their keyword.
pub fn strip_filename(filename: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(pos) => &filename[..pos],
        None => filename,
    };

    let mut cleaned = stem.replace('.', " ").replace('-', " ").replace('_', " ");
    for keyword in TITLE_SPLIT_KEYWORDS {
        if let Some(pos) = cleaned.find(keyword) {
            cleaned.truncate(pos);
        }
    }
    cleaned.trim().to_string()
}

/// Parse a video path into title, season and episode.
///
/// Directory layouts are tried against the whole path before filename
/// markers, since curated folder trees are less noisy than release
/// filenames. The first pattern that matches wins. Paths with no
/// recognizable markers fall back to the stripped filename with season
/// and episode 0.
pub fn parse_path(path: &str) -> VideoFileInfo {
    let path = path.to_lowercase();
    let basename = path
        .rsplit('/')
        .next()
        .unwrap_or(&path)
        .rsplit('\\')
        .next()
        .unwrap_or(&path);
    let filename = strip_filename(basename);

    if let Some(info) = try_parse_path(&path) {
        return info;
    }
    if let Some(info) = try_parse_filename(&filename) {
        return info;
    }

    VideoFileInfo {
        title: filename,
        season: 0,
        episode: 0,
    }
}

fn try_parse_path(path: &str) -> Option<VideoFileInfo> {
    let caps = RE_PATH_SEASON_DIR
        .captures(path)
        .or_else(|| RE_PATH_DASHED_DIR.captures(path))?;
    info_from_captures(&caps)
}

fn try_parse_filename(filename: &str) -> Option<VideoFileInfo> {
    let caps = RE_FILE_MARKER
        .captures(filename)
        .or_else(|| RE_FILE_SPELLED.captures(filename))?;
    info_from_captures(&caps)
}

/// The title capture of a path pattern can span several directories; only
/// its last component names the series.
fn info_from_captures(caps: &regex::Captures<'_>) -> Option<VideoFileInfo> {
    let raw_title = caps.name("title")?.as_str();
    let title = raw_title
        .rsplit('/')
        .next()
        .unwrap_or(raw_title)
        .trim()
        .to_string();
    Some(VideoFileInfo {
        title,
        season: caps.name("season")?.as_str().parse().ok()?,
        episode: caps.name("episode")?.as_str().parse().ok()?,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
