#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rescache::prelude::*;
use rescache::res::resource::options_as;

declare_resource_type!(pub IMAGE, "Image");
declare_resource_type!(pub BITMAP, "Bitmap", IMAGE);
declare_resource_type!(pub TEXTURE, "Texture");

pub fn setup() {
    let _ = env_logger::try_init();
}

/// A `Memory` provider that counts the streams it opened.
#[derive(Default)]
pub struct CountingProvider {
    pub files: Memory,
    opened: AtomicUsize,
}

impl CountingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(CountingProvider::default())
    }

    pub fn insert(&self, path: &str, bytes: &[u8]) {
        self.files.insert(path, bytes);
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl StreamProvider for CountingProvider {
    fn open_read(&self, path: &Path) -> Option<Box<dyn ReadStream>> {
        let stream = self.files.open_read(path)?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Some(stream)
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.exists(path)
    }
}

pub struct Image {
    pub ty: &'static ResourceType,
    pub format: String,
    pub tag: String,
    pub bytes: Vec<u8>,
    pub policy: CachePolicy,
}

impl Resource for Image {
    fn resource_type(&self) -> &'static ResourceType {
        self.ty
    }

    fn system_memory_use(&self) -> usize {
        self.bytes.len()
    }

    fn cache_policy(&self) -> CachePolicy {
        self.policy
    }
}

/// Loads any stream into an `Image` of the given type, remembering the file extension and
/// the `OptionsTag` of the request.
pub struct ImageLoader {
    pub ty: &'static ResourceType,
    pub extensions: Vec<&'static str>,
    pub priority: i32,
    pub policy: CachePolicy,
    pub loads: AtomicUsize,
}

impl ImageLoader {
    pub fn new(ty: &'static ResourceType, extensions: &[&'static str]) -> Self {
        ImageLoader {
            ty,
            extensions: extensions.to_vec(),
            priority: 0,
            policy: CachePolicy::CanCache,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ResourceLoader for ImageLoader {
    fn resource_type(&self) -> &'static ResourceType {
        self.ty
    }

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn load(&self, ctx: &mut LoaderContext) -> Result<Arc<dyn Resource>, failure::Error> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        let bytes = ctx.read_to_end()?;
        let format = ctx
            .path
            .extension()
            .and_then(|v| v.to_str())
            .unwrap_or("")
            .to_owned();

        let tag = options_as::<OptionsTag>(ctx.options)
            .map(|v| v.text().to_owned())
            .unwrap_or_default();

        Ok(Arc::new(Image {
            ty: self.ty,
            format,
            tag,
            bytes,
            policy: self.policy,
        }))
    }
}

/// Always fails.
pub struct FailingLoader {
    pub ty: &'static ResourceType,
    pub extensions: Vec<&'static str>,
    pub priority: i32,
    pub calls: AtomicUsize,
}

impl FailingLoader {
    pub fn new(ty: &'static ResourceType, extensions: &[&'static str], priority: i32) -> Self {
        FailingLoader {
            ty,
            extensions: extensions.to_vec(),
            priority,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ResourceLoader for FailingLoader {
    fn resource_type(&self) -> &'static ResourceType {
        self.ty
    }

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn load(&self, ctx: &mut LoaderContext) -> Result<Arc<dyn Resource>, failure::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        bail!("{:?} is malformed.", ctx.path);
    }
}

/// A texture keeps the image it was converted from alive.
pub struct Texture {
    pub image: Arc<dyn Resource>,
}

impl Resource for Texture {
    fn resource_type(&self) -> &'static ResourceType {
        &TEXTURE
    }

    fn system_memory_use(&self) -> usize {
        16
    }

    fn video_memory_use(&self) -> usize {
        self.image.system_memory_use()
    }

    fn used_resources(&self, out: &mut Vec<Arc<dyn Resource>>) -> usize {
        out.push(self.image.clone());
        1
    }
}

impl ResourceKind for Texture {
    fn static_type() -> &'static ResourceType {
        &TEXTURE
    }
}

#[derive(Default)]
pub struct TextureConverter {
    pub converts: AtomicUsize,
}

impl TextureConverter {
    pub fn converts(&self) -> usize {
        self.converts.load(Ordering::SeqCst)
    }
}

impl ResourceConverter for TextureConverter {
    fn raw_type(&self) -> &'static ResourceType {
        &IMAGE
    }

    fn resource_type(&self) -> &'static ResourceType {
        &TEXTURE
    }

    fn convert(
        &self,
        _: &ConverterContext,
        raw: &Arc<dyn Resource>,
    ) -> Result<Arc<dyn Resource>, failure::Error> {
        self.converts.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Texture { image: raw.clone() }))
    }
}

pub fn image(resource: &Arc<dyn Resource>) -> &Image {
    downcast_ref::<Image>(&**resource).unwrap()
}
