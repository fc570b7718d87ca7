use std::fs;

use daftar_core::{storage::BookStorage, CoreError};
use daftar_domain::{Book, EntryDraft};
use daftar_storage_json::{JsonBookStorage, StoragePaths};
use rust_decimal_macros::dec;
use tempfile::tempdir;

#[test]
fn json_storage_can_save_and_load_book() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStorage::new(StoragePaths::under(dir.path())).expect("create storage");

    let mut book = Book::new("Umrah Agency", "USD");
    let cashbox = book.ensure_cashbox("USD");
    let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    book.append_entry(
        cashbox,
        EntryDraft::new_debit(date, "float", dec!(125.50)),
        None,
        chrono::Utc::now(),
    );

    storage.save_book("Umrah Agency", &book).expect("save book");
    let loaded = storage.load_book("Umrah Agency").expect("load book");

    assert_eq!(loaded.name, "Umrah Agency");
    assert_eq!(loaded.cashbox_balance("USD"), dec!(125.50));
    let path = storage.book_path("Umrah Agency");
    assert_eq!(path.file_name().and_then(|name| name.to_str()), Some("umrah_agency.json"));
    assert!(path.exists());
    assert_eq!(storage.list_books().unwrap(), vec!["umrah_agency".to_string()]);
}

#[test]
fn missing_book_is_reported_as_not_found() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStorage::new(StoragePaths::under(dir.path())).expect("create storage");

    let err = storage.load_book("nobody").expect_err("missing");
    assert!(matches!(err, CoreError::BookNotFound(ref name) if name == "nobody"));
}

#[test]
fn corrupt_file_is_a_serde_error() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStorage::new(StoragePaths::under(dir.path())).expect("create storage");
    fs::write(storage.book_path("broken"), "{ not json").expect("write garbage");

    let err = storage.load_book("broken").expect_err("corrupt");
    assert!(matches!(err, CoreError::Serde(_)));
}

#[test]
fn json_storage_creates_and_restores_backups() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths::under(dir.path());
    let storage = JsonBookStorage::new(paths.clone()).expect("create storage");

    let book = Book::new("Agency", "USD");
    storage.save_book("agency", &book).expect("save book");
    let info = storage
        .backup_book("agency", &book, Some("Before close"))
        .expect("create backup");
    assert!(info.id.ends_with("_before-close.json"));
    assert_eq!(info.path.parent(), Some(paths.backup_root.join("agency").as_path()));

    let mut changed = book.clone();
    changed.ensure_cashbox("SAR");
    storage.save_book("agency", &changed).expect("save changed book");

    let backups = storage.list_backups("agency").expect("list backups");
    assert!(backups.iter().any(|entry| entry.id == info.id));

    let restored = storage.restore_backup(&info).expect("restore backup");
    assert!(restored.accounts.is_empty());
    assert!(storage.load_book("agency").unwrap().accounts.is_empty());
}

#[test]
fn overwriting_keeps_only_retained_backups() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStorage::with_retention(StoragePaths::under(dir.path()), 2)
        .expect("create storage");

    let book = Book::new("Agency", "USD");
    for _ in 0..5 {
        storage.save_book("agency", &book).expect("save book");
    }

    let backups = storage.list_backups("agency").expect("list backups");
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().all(|entry| entry.path.exists()));
}

#[test]
fn deleting_a_book_removes_its_file() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStorage::new(StoragePaths::under(dir.path())).expect("create storage");
    storage.save_book("agency", &Book::new("Agency", "USD")).unwrap();

    storage.delete_book("agency").expect("delete");
    assert!(storage.list_books().unwrap().is_empty());
    storage.delete_book("agency").expect("deleting twice is fine");
}

#[test]
fn corrupt_book_is_not_replaced_on_open() {
    use std::sync::Arc;

    use daftar_core::{
        storage::{FallbackStorage, MemoryBookStorage},
        time::FixedClock,
        BookManager,
    };

    let dir = tempdir().expect("tempdir");
    let storage = JsonBookStorage::new(StoragePaths::under(dir.path())).expect("create storage");
    let mut book = Book::new("Agency", "USD");
    book.ensure_cashbox("USD");
    storage.save_book("agency", &book).expect("save book");

    let path = storage.book_path("agency");
    let mut damaged = fs::read_to_string(&path).expect("read book");
    damaged.push('}');
    fs::write(&path, &damaged).expect("damage book");

    let clock = Arc::new(FixedClock::on(chrono::NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()));
    let fallback = FallbackStorage::new(Box::new(storage), Box::new(MemoryBookStorage::new()));
    let err = BookManager::open("agency", Box::new(fallback), clock, "USD")
        .err()
        .expect("corrupt book");

    assert!(matches!(err, CoreError::Serde(_)));
    assert_eq!(fs::read_to_string(&path).expect("read book"), damaged);
}
