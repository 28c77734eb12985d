use std::fs::OpenOptions;
use std::path::Path;

use slotdb::storage::{FreelistHeader, PageType};
use slotdb::{Database, PAGE_SIZE};

fn open_db(path: &Path) -> Database<std::fs::File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .unwrap();
    Database::open(file).unwrap()
}

#[test]
fn create_database_writes_first_page() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open_db(&dir.path().join("test.db"));

    let page = db.pager.get_page(0).unwrap();
    assert_eq!(page.page_type(), PageType::First);

    let header = db.pager.first_header().unwrap();
    assert_eq!(header.version(), 1);
    assert_eq!(header.freelist_head(), 0);
}

#[test]
fn freelist_allocates_in_reverse_free_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open_db(&dir.path().join("test.db"));

    assert_eq!(db.pager.first_header().unwrap().freelist_head(), 0);

    let a = db.pager.next_free().unwrap();
    assert_eq!(a, 1);
    assert_eq!(db.pager.file_size(), 2 * PAGE_SIZE as u64);

    let b = db.pager.next_free().unwrap();
    assert_eq!(b, 2);
    assert_eq!(db.pager.file_size(), 3 * PAGE_SIZE as u64);

    // freeing a page rewrites its header and heads the list
    db.pager.get_page_mut(a).unwrap().set_page_type(PageType::Leaf);
    db.pager.free_page(a).unwrap();
    assert_eq!(db.pager.get_page(a).unwrap().page_type(), PageType::Freelist);
    assert_eq!(db.pager.first_header().unwrap().freelist_head(), a);

    // reuse the previously freed page without growing the file
    let a = db.pager.next_free().unwrap();
    assert_eq!(a, 1);
    assert_eq!(db.pager.first_header().unwrap().freelist_head(), 0);
    assert_eq!(db.pager.file_size(), 3 * PAGE_SIZE as u64);

    db.pager.free_page(a).unwrap();
    db.pager.free_page(b).unwrap();

    // the list pops in reverse order
    assert_eq!(db.pager.first_header().unwrap().freelist_head(), b);
    let b = db.pager.next_free().unwrap();
    assert_eq!(b, 2);
    assert_eq!(db.pager.first_header().unwrap().freelist_head(), a);
    let a = db.pager.next_free().unwrap();
    assert_eq!(a, 1);
    assert_eq!(db.pager.first_header().unwrap().freelist_head(), 0);
}

#[test]
fn freelist_links_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    {
        let mut db = open_db(&path);
        let a = db.pager.next_free().unwrap();
        let b = db.pager.next_free().unwrap();
        db.pager.free_page(a).unwrap();
        db.pager.free_page(b).unwrap();
        db.pager.flush_all().unwrap();
    }

    let mut db = open_db(&path);
    assert_eq!(db.pager.file_size(), 3 * PAGE_SIZE as u64);
    assert_eq!(db.pager.first_header().unwrap().freelist_head(), 2);

    let page = db.pager.get_page(2).unwrap();
    assert_eq!(page.page_type(), PageType::Freelist);
    assert_eq!(page.view::<FreelistHeader>().next(), 1);

    // allocation keeps working against the reloaded chain
    assert_eq!(db.pager.next_free().unwrap(), 2);
    assert_eq!(db.pager.next_free().unwrap(), 1);
    assert_eq!(db.pager.next_free().unwrap(), 3);
}

#[test]
fn flushed_pages_reload_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    let before = {
        let mut db = open_db(&path);
        let (id, page) = db.pager.from_next_free(PageType::Overflow).unwrap();
        page.bytes_mut()[50..60].copy_from_slice(b"persisted!");
        let snapshot = page.bytes().to_vec();
        db.pager.flush_page(id).unwrap();
        snapshot
    };

    let mut db = open_db(&path);
    assert_eq!(db.pager.get_page(1).unwrap().bytes(), &before[..]);
}
