use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use daftar_core::{
    storage::{BookBackupInfo, BookStorage},
    CoreError,
};
use daftar_domain::Book;

const FILE_EXTENSION: &str = "json";
const BACKUP_DATE_FORMAT: &str = "%Y%m%d";
const BACKUP_TIME_FORMAT: &str = "%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// File stem used when a book name sanitises to nothing.
pub const DEFAULT_BOOK_NAME: &str = "ledger_app_data";

/// Directories holding live book files and their backups.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub book_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// `<data_dir>/books` and `<data_dir>/backups`.
    pub fn under(data_dir: &Path) -> Self {
        Self {
            book_root: data_dir.join("books"),
            backup_root: data_dir.join("backups"),
        }
    }
}

/// Filesystem-backed JSON persistence for books and their backups.
///
/// Saving over an existing book first copies the previous file into the
/// backup directory; backups beyond the retention count are pruned.
#[derive(Debug, Clone)]
pub struct JsonBookStorage {
    paths: StoragePaths,
    retention: usize,
}

impl JsonBookStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.book_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
        })
    }

    pub fn book_path(&self, name: &str) -> PathBuf {
        self.paths
            .book_root
            .join(format!("{}.{}", canonical_name(name), FILE_EXTENSION))
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.paths.backup_root.join(canonical_name(name))
    }

    fn write_backup(
        &self,
        name: &str,
        contents: &str,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError> {
        let dir = self.backup_dir(name);
        fs::create_dir_all(&dir)?;
        let now = Utc::now();
        let stamp = format!(
            "{}_{}",
            now.format(BACKUP_DATE_FORMAT),
            now.format(BACKUP_TIME_FORMAT)
        );
        let base = format!("{}_{}", canonical_name(name), stamp);
        let label = sanitize_backup_note(note);
        let mut attempt = 1;
        let (file_name, path) = loop {
            let mut stem = base.clone();
            if attempt > 1 {
                stem.push_str(&format!("-{attempt}"));
            }
            if let Some(label) = &label {
                stem.push('_');
                stem.push_str(label);
            }
            let file_name = format!("{stem}.{FILE_EXTENSION}");
            let path = dir.join(&file_name);
            if !path.exists() {
                break (file_name, path);
            }
            attempt += 1;
        };
        write_atomic(&path, contents)?;
        self.prune_backups(name)?;
        debug!(backup = %file_name, "book backup written");
        Ok(BookBackupInfo {
            book: canonical_name(name),
            id: file_name,
            created_at: now.to_rfc3339(),
            path,
        })
    }

    fn prune_backups(&self, name: &str) -> Result<(), CoreError> {
        for stale in self.list_backups(name)?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&stale.path) {
                debug!(backup = %stale.id, error = %err, "could not prune backup");
            }
        }
        Ok(())
    }
}

impl BookStorage for JsonBookStorage {
    fn save_book(&self, name: &str, book: &Book) -> Result<(), CoreError> {
        let path = self.book_path(name);
        if path.exists() {
            let previous = fs::read_to_string(&path)?;
            self.write_backup(name, &previous, None)?;
        }
        save_book_to_path(book, &path)
    }

    fn load_book(&self, name: &str) -> Result<Book, CoreError> {
        let path = self.book_path(name);
        if !path.exists() {
            return Err(CoreError::BookNotFound(name.to_string()));
        }
        load_book_from_path(&path)
    }

    fn list_books(&self) -> Result<Vec<String>, CoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.paths.book_root)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_book(&self, name: &str) -> Result<(), CoreError> {
        let path = self.book_path(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn backup_book(
        &self,
        name: &str,
        book: &Book,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError> {
        self.write_backup(name, &serialize_book(book)?, note)
    }

    /// Newest first.
    fn list_backups(&self, name: &str) -> Result<Vec<BookBackupInfo>, CoreError> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let slug = canonical_name(name);
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                let created_at = parse_backup_timestamp(file_name)
                    .map(|stamp| stamp.to_rfc3339())
                    .unwrap_or_default();
                entries.push(BookBackupInfo {
                    book: slug.clone(),
                    id: file_name.to_string(),
                    created_at,
                    path: path.clone(),
                });
            }
        }
        entries.sort_by_key(|info| Reverse((parse_backup_timestamp(&info.id), info.id.clone())));
        Ok(entries)
    }

    fn restore_backup(&self, backup: &BookBackupInfo) -> Result<Book, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!("backup `{}` not found", backup.id)));
        }
        let book = load_book_from_path(&backup.path)?;
        save_book_to_path(&book, &self.book_path(&backup.book))?;
        Ok(book)
    }
}

/// Writes `book` as pretty JSON via a temporary file and a rename.
pub fn save_book_to_path(book: &Book, path: &Path) -> Result<(), CoreError> {
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_book(book)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_book_from_path(path: &Path) -> Result<Book, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        DEFAULT_BOOK_NAME.into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Finds the `<yyyymmdd>_<hhmmssmmm>` pair inside a backup file name.
fn parse_backup_timestamp(file_name: &str) -> Option<DateTime<Utc>> {
    let stem = file_name.strip_suffix(&format!(".{FILE_EXTENSION}"))?;
    let segments: Vec<&str> = stem.split('_').collect();
    segments.windows(2).rev().find_map(|pair| {
        let (date, time) = (pair[0], pair[1].get(..9)?);
        if !is_digits(date, 8) || !is_digits(time, 9) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S%3f")
            .ok()
            .map(|naive| naive.and_utc())
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn serialize_book(book: &Book) -> Result<String, CoreError> {
    serde_json::to_string_pretty(book).map_err(|err| CoreError::Serde(err.to_string()))
}
