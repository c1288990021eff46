extern crate rescache;

use std::sync::Arc;

use rescache::prelude::*;
use rescache::res::assets;

fn testbed() -> ResourceCache {
    let _ = env_logger::try_init();

    let memory = Arc::new(Memory::new());
    memory.insert("notes/readme.dat", "Read me.");
    memory.insert("notes/broken.dat", vec![0xffu8, 0xfe, 0xfd]);

    let cache = ResourceCache::new();
    cache.add_provider(Arc::new(Directory::new("tests/assets").unwrap()));
    cache.add_provider(memory);
    assets::setup(&cache);
    cache
}

#[test]
fn binary_data() {
    let cache = testbed();
    let flags = ResourceCacheFlags::empty();

    let v = cache
        .load_as::<BinaryData, _>("foo/mock.dat", None, flags)
        .unwrap();

    assert_eq!(v.bytes(), &[0u8, 1, 2, 3, 0xff]);
    assert_eq!(v.len(), 5);

    let v = cache
        .load_as::<BinaryData, _>("foo/mock.bin", None, flags)
        .unwrap();

    assert_eq!(v.bytes(), b"mock");

    // Text files are not binary data unless asked explicitly.
    assert!(cache.load("mock.txt", &BINARY_DATA, None, flags).is_none());
    let v = cache
        .load_as::<BinaryData, _>("mock.txt", None, ResourceCacheFlags::IGNORE_EXTENSION)
        .unwrap();

    assert_eq!(v.bytes(), b"Hello, World!");
}

#[test]
fn custom_extensions() {
    let cache = ResourceCache::new();
    cache.add_provider(Arc::new(Directory::new("tests/assets").unwrap()));
    cache.add_loader(Arc::new(BinaryDataLoader::with_extensions(&["txt"])));

    let v = cache
        .load_as::<BinaryData, _>("mock.txt", None, ResourceCacheFlags::empty())
        .unwrap();

    assert_eq!(v.bytes(), b"Hello, World!");
    assert!(cache
        .load("foo/mock.dat", &BINARY_DATA, None, ResourceCacheFlags::QUIET)
        .is_none());
}

#[test]
fn text_data() {
    let cache = testbed();
    let flags = ResourceCacheFlags::empty();

    let v = cache.load_as::<TextData, _>("mock.txt", None, flags).unwrap();
    assert_eq!(v.text(), "Hello, World!");

    // Converted from the binary data of a `.dat` file.
    let v = cache
        .load_as::<TextData, _>("notes/readme.dat", None, flags)
        .unwrap();

    assert_eq!(v.text(), "Read me.");
    assert!(cache.contains("notes/readme.dat", &BINARY_DATA, None));
    assert!(cache.contains("notes/readme.dat", &TEXT_DATA, None));

    assert!(cache
        .load("notes/broken.dat", &TEXT_DATA, None, ResourceCacheFlags::QUIET)
        .is_none());

    match cache.try_load("notes/broken.dat", &TEXT_DATA, None, ResourceCacheFlags::QUIET) {
        Err(Error::Unavailable { .. }) => {}
        _ => panic!("expects Unavailable."),
    }

    // The raw bytes stay loadable.
    assert!(cache.contains("notes/broken.dat", &BINARY_DATA, None));
}

/// Claims to be `BinaryData` but is something else.
struct Impostor;

impl Resource for Impostor {
    fn resource_type(&self) -> &'static ResourceType {
        &BINARY_DATA
    }

    fn system_memory_use(&self) -> usize {
        0
    }
}

struct ImpostorLoader;

impl ResourceLoader for ImpostorLoader {
    fn resource_type(&self) -> &'static ResourceType {
        &BINARY_DATA
    }

    fn extensions(&self) -> &[&str] {
        &["fake"]
    }

    fn load(&self, _: &mut LoaderContext) -> Result<Arc<dyn Resource>, failure::Error> {
        Ok(Arc::new(Impostor))
    }
}

#[test]
fn mistyped_raw_data() {
    let cache = testbed();
    cache.add_loader(Arc::new(ImpostorLoader));

    let memory = Arc::new(Memory::new());
    memory.insert("notes/impostor.fake", "Not really bytes.");
    cache.add_provider(memory);

    let flags = ResourceCacheFlags::empty();
    assert!(cache.load("notes/impostor.fake", &TEXT_DATA, None, flags).is_none());

    match cache.try_load("notes/impostor.fake", &TEXT_DATA, None, flags) {
        Err(Error::Unavailable { .. }) => {}
        _ => panic!("expects Unavailable."),
    }

    // The raw resource is cached as it was declared, but it is no `BinaryData`.
    assert!(cache.contains("notes/impostor.fake", &BINARY_DATA, None));
    assert!(cache
        .load_as::<BinaryData, _>("notes/impostor.fake", None, flags)
        .is_none());
    assert!(!cache.contains("notes/impostor.fake", &TEXT_DATA, None));
}

#[test]
fn created_binary_data() {
    let cache = testbed();
    let flags = ResourceCacheFlags::empty();

    let v = cache
        .create_as::<BinaryData, _>(&vec![1u8, 2, 3], None, flags)
        .unwrap();

    assert_eq!(v.bytes(), &[1u8, 2, 3]);

    let bytes: &'static [u8] = b"static";
    let w = cache.create_as::<BinaryData, _>(&bytes, None, flags).unwrap();
    assert_eq!(w.bytes(), b"static");

    // Created resources are never cached.
    assert!(cache.is_empty());

    assert!(cache.create(&BINARY_DATA, &42u32, None, flags).is_none());
    match cache.try_create(&BINARY_DATA, &42u32, None, flags) {
        Err(Error::NoHandler { .. }) => {}
        _ => panic!("expects NoHandler."),
    }

    match cache.try_create(&TEXT_DATA, &vec![1u8], None, flags) {
        Err(Error::NoHandler { .. }) => {}
        _ => panic!("expects NoHandler."),
    }
}

#[test]
fn resource_list() {
    let cache = testbed();
    let flags = ResourceCacheFlags::empty();

    let a = cache.load_as::<TextData, _>("mock.txt", None, flags).unwrap();
    let b = cache
        .load_as::<BinaryData, _>("foo/mock.dat", None, flags)
        .unwrap();

    let mut list: ResourceList<TextData> = ResourceList::default();
    list.push(a.clone());
    list.push(a.clone());
    assert_eq!(list.len(), 2);
    assert_eq!(list.resource_type(), &RESOURCE_LIST);

    let mut used = Vec::new();
    assert_eq!(list.used_resources(&mut used), 2);

    // Cached resources are counted once, however many lists use them.
    let memory = cache.calc_memory_use();
    assert_eq!(
        memory.system,
        a.system_memory_use() + b.system_memory_use()
    );

    assert_eq!(cache.unload_unused(), 0);
    drop(a);
    drop(used);
    assert_eq!(cache.unload_unused(), 0);
    drop(list);
    drop(b);
    assert_eq!(cache.unload_unused(), 2);
}
