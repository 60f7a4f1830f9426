use std::path::PathBuf;

/// Каталоги, которые просматриваются всегда, после объявленных в меню
pub const DEFAULT_ICON_DIRS: [&str; 6] = [
    "/usr/local/lib/X11/pixmaps",
    "/usr/share/pixmaps",
    "/usr/share/icons/hicolor/48x48/apps",
    "/usr/share/icons/hicolor/32x32/apps",
    "/usr/share/icons/hicolor/64x64/apps",
    "/usr/share/pixmaps/puppy",
];

/// Объявленные каталоги в порядке документа, затем стандартные, без повторов
pub fn icon_search_dirs<I, S>(declared: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut dirs: Vec<PathBuf> = Vec::new();

    let candidates = declared
        .into_iter()
        .map(|d| d.as_ref().trim().to_string())
        .filter(|d| !d.is_empty())
        .chain(DEFAULT_ICON_DIRS.iter().map(|d| d.to_string()));

    for dir in candidates {
        let dir = PathBuf::from(dir);
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }

    dirs
}
