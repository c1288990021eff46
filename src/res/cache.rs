//! The `ResourceCache` orchestrates stream providers, handlers and the cache table.
//!
//! Entries are keyed by `hash_combine(hash(canonical path), options hash)` into a flat
//! multimap. A single key may hold several resources of unrelated types, e.g. the raw
//! `BinaryData` of an image next to the texture converted from it. Every entry remembers its
//! path and options hash, so hash collisions never alias two different requests.

use std::any::Any;
use std::io::{Seek, SeekFrom};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use smallvec::SmallVec;

use crate::errors::*;
use crate::utils::{hash64, hash_combine, FastHashMap, FastHashSet};

use super::flags::ResourceCacheFlags;
use super::handler::{
    ConverterContext, CreatorContext, LoaderContext, ResourceConverter, ResourceCreator,
    ResourceLoader,
};
use super::inflight::{Claim, InFlight, LoadKey};
use super::registry::HandlerRegistry;
use super::resource::{self, CachePolicy, Resource, ResourceKind, ResourceOptions};
use super::settings::CacheParams;
use super::types::ResourceType;
use super::vfs::{self, ReadStream, StreamProvider};

struct CacheEntry {
    path: PathBuf,
    options: u64,
    resource: Arc<dyn Resource>,
}

type Bucket = SmallVec<[CacheEntry; 2]>;

/// One line of `ResourceCache::usage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUsage {
    pub index: usize,
    pub path: PathBuf,
    pub type_name: &'static str,
    /// Strong references to the resource, including the one held by the cache.
    pub strong_count: usize,
    pub system_memory: usize,
    pub video_memory: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUse {
    pub system: usize,
    pub video: usize,
}

/// A typed, path-keyed and reference-counted resource cache.
///
/// Every method takes `&self`, the cache could be shared between threads with an `Arc`.
/// Handlers run without any lock held, so they could call back into the cache to load
/// their dependencies.
pub struct ResourceCache {
    params: CacheParams,
    providers: RwLock<Vec<Arc<dyn StreamProvider>>>,
    registry: RwLock<HandlerRegistry>,
    table: RwLock<FastHashMap<u64, Bucket>>,
    inflight: InFlight,
}

impl Default for ResourceCache {
    fn default() -> Self {
        ResourceCache::new()
    }
}

fn cache_key(path: &Path, options: u64) -> u64 {
    hash_combine(hash64(path), options)
}

impl ResourceCache {
    /// Creates an empty cache with default parameters.
    pub fn new() -> Self {
        ResourceCache::with_params(CacheParams::default())
    }

    pub fn with_params(params: CacheParams) -> Self {
        let registry = HandlerRegistry::new(params.max_type_depth);

        ResourceCache {
            params,
            providers: RwLock::new(Vec::new()),
            registry: RwLock::new(registry),
            table: RwLock::new(FastHashMap::default()),
            inflight: InFlight::new(),
        }
    }

    #[inline]
    pub fn params(&self) -> &CacheParams {
        &self.params
    }

    /// Appends a stream provider. Providers are queried in the order they were added.
    pub fn add_provider(&self, provider: Arc<dyn StreamProvider>) {
        self.providers.write().unwrap().push(provider);
    }

    /// Drops all the stream providers. Cached resources are left untouched.
    pub fn clear(&self) {
        self.providers.write().unwrap().clear();
    }

    /// Opens `path` with the first provider that has it.
    pub fn open_read<P: AsRef<Path>>(&self, path: P) -> Option<Box<dyn ReadStream>> {
        let path = vfs::canonicalize(path);
        self.providers().iter().find_map(|v| v.open_read(&path))
    }

    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = vfs::canonicalize(path);
        self.providers().iter().any(|v| v.exists(&path))
    }

    fn providers(&self) -> Vec<Arc<dyn StreamProvider>> {
        self.providers.read().unwrap().clone()
    }

    /// Registers a loader under its type and all the ancestors of its type. Returns false
    /// if the same loader has been registered before.
    pub fn add_loader(&self, loader: Arc<dyn ResourceLoader>) -> bool {
        self.registry.write().unwrap().add_loader(loader)
    }

    pub fn add_converter(&self, converter: Arc<dyn ResourceConverter>) -> bool {
        self.registry.write().unwrap().add_converter(converter)
    }

    pub fn add_creator(&self, creator: Arc<dyn ResourceCreator>) -> bool {
        self.registry.write().unwrap().add_creator(creator)
    }

    pub fn loaders(&self, ty: &'static ResourceType) -> Vec<Arc<dyn ResourceLoader>> {
        self.registry.read().unwrap().loaders(ty)
    }

    pub fn converters(&self, ty: &'static ResourceType) -> Vec<Arc<dyn ResourceConverter>> {
        self.registry.read().unwrap().converters(ty)
    }

    pub fn creators(&self, ty: &'static ResourceType) -> Vec<Arc<dyn ResourceCreator>> {
        self.registry.read().unwrap().creators(ty)
    }

    /// Finds a cached resource at `path` whose type is `ty` or derived from `ty`.
    pub fn find<P: AsRef<Path>>(
        &self,
        path: P,
        ty: &'static ResourceType,
        options: Option<&dyn ResourceOptions>,
    ) -> Option<Arc<dyn Resource>> {
        let path = vfs::canonicalize(path);
        self.find_hashed(&path, ty, resource::options_hash(options))
    }

    /// Finds a cached resource of concrete type `T`.
    pub fn find_as<T: ResourceKind, P: AsRef<Path>>(
        &self,
        path: P,
        options: Option<&dyn ResourceOptions>,
    ) -> Option<Arc<T>> {
        self.find(path, T::static_type(), options)
            .and_then(resource::downcast)
    }

    /// Returns true if `find` would succeed.
    pub fn contains<P: AsRef<Path>>(
        &self,
        path: P,
        ty: &'static ResourceType,
        options: Option<&dyn ResourceOptions>,
    ) -> bool {
        self.find(path, ty, options).is_some()
    }

    /// Returns the path under which `resource` is cached.
    pub fn find_path(&self, resource: &Arc<dyn Resource>) -> Option<PathBuf> {
        let table = self.table.read().unwrap();
        for bucket in table.values() {
            for v in bucket.iter() {
                if Arc::ptr_eq(&v.resource, resource) {
                    return Some(v.path.clone());
                }
            }
        }

        None
    }

    fn find_hashed(
        &self,
        path: &Path,
        ty: &'static ResourceType,
        options: u64,
    ) -> Option<Arc<dyn Resource>> {
        let table = self.table.read().unwrap();
        let bucket = table.get(&cache_key(path, options))?;

        bucket
            .iter()
            .find(|v| {
                v.options == options
                    && v.path == path
                    && v.resource.resource_type().is_derived_from(ty)
            })
            .map(|v| v.resource.clone())
    }

    /// Loads a resource, or returns the cached one. Failures are logged unless quiet, and
    /// surface as `None`.
    pub fn load<P: AsRef<Path>>(
        &self,
        path: P,
        ty: &'static ResourceType,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
    ) -> Option<Arc<dyn Resource>> {
        match self.try_load(path, ty, options, flags) {
            Ok(v) => Some(v),
            Err(err) => {
                if !self.is_quiet(flags) {
                    match err {
                        Error::Cyclic { .. } => error!("{}", err),
                        _ => warn!("{}", err),
                    }
                }

                None
            }
        }
    }

    /// Loads a resource of concrete type `T`.
    pub fn load_as<T: ResourceKind, P: AsRef<Path>>(
        &self,
        path: P,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
    ) -> Option<Arc<T>> {
        self.load(path, T::static_type(), options, flags)
            .and_then(resource::downcast)
    }

    /// Loads a resource, or returns the cached one.
    ///
    /// On a miss, the loaders registered for `ty` are tried first, in order, against every
    /// provider that opens the path. Then the converters registered for `ty`, each of which
    /// loads its raw type from the same path. The first success is committed to the cache
    /// table unless its policy says otherwise.
    pub fn try_load<P: AsRef<Path>>(
        &self,
        path: P,
        ty: &'static ResourceType,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
    ) -> Result<Arc<dyn Resource>> {
        let path = vfs::canonicalize(path);
        self.load_resolved(&path, ty, options, flags).map(|(_, v)| v)
    }

    // Loads a resource at a canonical path, and returns it together with the path it is
    // cached under. The two differ only for wildcard requests.
    fn load_resolved(
        &self,
        path: &Path,
        ty: &'static ResourceType,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
    ) -> Result<(PathBuf, Arc<dyn Resource>)> {
        let hash = resource::options_hash(options);

        if let Some(v) = self.find_hashed(path, ty, hash) {
            if self.params.trace {
                debug!("Hits {} at {:?}.", ty, path);
            }

            return Ok((path.to_owned(), v));
        }

        let key = LoadKey {
            path: path.to_owned(),
            ty,
            options: hash,
        };

        loop {
            match self.inflight.claim(&key)? {
                Claim::Waited => {
                    if let Some(v) = self.find_hashed(path, ty, hash) {
                        return Ok((path.to_owned(), v));
                    }
                }
                Claim::Owned(_guard) => {
                    if let Some(v) = self.find_hashed(path, ty, hash) {
                        return Ok((path.to_owned(), v));
                    }

                    let (resolved, v) = self.load_resource(path, ty, options, flags)?;
                    let v = self.commit(resolved.clone(), hash, v);
                    return Ok((resolved, v));
                }
            }
        }
    }

    fn load_resource(
        &self,
        path: &Path,
        ty: &'static ResourceType,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
    ) -> Result<(PathBuf, Arc<dyn Resource>)> {
        let (loaders, converters) = {
            let registry = self.registry.read().unwrap();
            (registry.loaders(ty), registry.converters(ty))
        };

        if loaders.is_empty() && converters.is_empty() {
            return Err(Error::NoHandler {
                path: path.to_owned(),
                ty: ty.name(),
            });
        }

        let mut failed = false;
        if let Some(v) = self.load_with_loaders(path, ty, options, flags, &loaders, &mut failed) {
            return Ok(v);
        }

        if let Some(v) = self.convert(path, ty, options, flags, &converters, &mut failed) {
            return Ok(v);
        }

        if failed {
            Err(Error::Unavailable {
                path: path.to_owned(),
                ty: ty.name(),
            })
        } else {
            Err(Error::NotFound(path.to_owned()))
        }
    }

    fn load_with_loaders(
        &self,
        path: &Path,
        ty: &'static ResourceType,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
        loaders: &[Arc<dyn ResourceLoader>],
        failed: &mut bool,
    ) -> Option<(PathBuf, Arc<dyn Resource>)> {
        if loaders.is_empty() {
            return None;
        }

        let extension = path.extension().and_then(|v| v.to_str()).unwrap_or("");

        // Substitutes every extension of every loader, in order.
        if extension == self.params.wildcard {
            let hash = resource::options_hash(options);
            for loader in loaders {
                for ext in loader.extensions() {
                    let candidate = path.with_extension(ext.trim_start_matches('.'));
                    let key = LoadKey {
                        path: candidate.clone(),
                        ty,
                        options: hash,
                    };

                    // Shares the work with plain requests of the substituted path.
                    let guard = loop {
                        if let Some(v) = self.find_hashed(&candidate, ty, hash) {
                            return Some((candidate, v));
                        }

                        match self.inflight.claim(&key) {
                            Ok(Claim::Owned(guard)) => break Some(guard),
                            Ok(Claim::Waited) => continue,
                            Err(err) => {
                                if !self.is_quiet(flags) {
                                    error!("{}", err);
                                }

                                *failed = true;
                                break None;
                            }
                        }
                    };

                    if guard.is_none() {
                        continue;
                    }

                    if let Some(mut stream) = self.open_read(&candidate) {
                        let ctx = LoaderContext {
                            path: &candidate,
                            cache: self,
                            stream: &mut *stream,
                            options,
                            flags,
                        };

                        if let Some(v) = self.invoke_loader(loader, ty, ctx, failed) {
                            let v = self.commit(candidate.clone(), hash, v);
                            return Some((candidate, v));
                        }
                    }
                }
            }

            return None;
        }

        let candidates: Vec<_> = loaders
            .iter()
            .filter(|v| {
                flags.contains(ResourceCacheFlags::IGNORE_EXTENSION)
                    || v.can_load_extension(extension)
            })
            .collect();

        if candidates.is_empty() {
            return None;
        }

        for provider in self.providers() {
            let mut stream = match provider.open_read(path) {
                Some(v) => v,
                None => continue,
            };

            for loader in &candidates {
                if let Err(err) = stream.seek(SeekFrom::Start(0)) {
                    if !self.is_quiet(flags) {
                        error!("Failed to rewind the stream of {:?}: {}", path, err);
                    }

                    *failed = true;
                    break;
                }

                let ctx = LoaderContext {
                    path,
                    cache: self,
                    stream: &mut *stream,
                    options,
                    flags,
                };

                if let Some(v) = self.invoke_loader(loader, ty, ctx, failed) {
                    return Some((path.to_owned(), v));
                }
            }
        }

        None
    }

    fn invoke_loader(
        &self,
        loader: &Arc<dyn ResourceLoader>,
        ty: &'static ResourceType,
        mut ctx: LoaderContext,
        failed: &mut bool,
    ) -> Option<Arc<dyn Resource>> {
        let quiet = self.is_quiet(ctx.flags);
        match loader.load(&mut ctx) {
            Ok(v) => {
                if v.resource_type().is_derived_from(ty) {
                    debug!("Loads {} from {:?}.", v.resource_type(), ctx.path);
                    return Some(v);
                }

                if !quiet {
                    error!(
                        "The loader of {} produced {} at {:?}, which is not a {}.",
                        loader.resource_type(),
                        v.resource_type(),
                        ctx.path,
                        ty
                    );
                }
            }
            Err(err) => {
                if !quiet {
                    error!(
                        "The loader of {} failed at {:?}: {}",
                        loader.resource_type(),
                        ctx.path,
                        err
                    );
                }
            }
        }

        *failed = true;
        None
    }

    fn convert(
        &self,
        path: &Path,
        ty: &'static ResourceType,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
        converters: &[Arc<dyn ResourceConverter>],
        failed: &mut bool,
    ) -> Option<(PathBuf, Arc<dyn Resource>)> {
        let quiet = self.is_quiet(flags);

        for converter in converters {
            let raw_type = converter.raw_type();
            let (raw_path, raw) = match self.load_resolved(path, raw_type, options, flags) {
                Ok(v) => v,
                Err(Error::NotFound(_)) | Err(Error::NoHandler { .. }) => continue,
                Err(err) => {
                    if let Error::Cyclic { .. } = err {
                        if !quiet {
                            error!("{}", err);
                        }
                    }

                    *failed = true;
                    continue;
                }
            };

            if raw_path != path {
                let hash = resource::options_hash(options);
                if let Some(v) = self.find_hashed(&raw_path, ty, hash) {
                    return Some((raw_path, v));
                }
            }

            let ctx = ConverterContext {
                path: &raw_path,
                cache: self,
                options,
                flags,
            };

            match converter.convert(&ctx, &raw) {
                Ok(v) => {
                    if v.resource_type().is_derived_from(ty) {
                        debug!(
                            "Converts {} into {} at {:?}.",
                            raw.resource_type(),
                            v.resource_type(),
                            raw_path
                        );

                        return Some((raw_path, v));
                    }

                    if !quiet {
                        error!(
                            "The converter into {} produced {} at {:?}.",
                            converter.resource_type(),
                            v.resource_type(),
                            raw_path
                        );
                    }
                }
                Err(err) => {
                    if !quiet {
                        error!(
                            "Failed to convert {} into {} at {:?}: {}",
                            raw.resource_type(),
                            converter.resource_type(),
                            raw_path,
                            err
                        );
                    }
                }
            }

            *failed = true;
        }

        None
    }

    // Commits a freshly produced resource. If another resource of the very same type got
    // there first, that one wins and is returned instead.
    fn commit(&self, path: PathBuf, options: u64, resource: Arc<dyn Resource>) -> Arc<dyn Resource> {
        if resource.cache_policy() == CachePolicy::NoCache {
            return resource;
        }

        let ty = resource.resource_type();
        let mut table = self.table.write().unwrap();
        let bucket = table.entry(cache_key(&path, options)).or_default();

        if let Some(v) = bucket
            .iter()
            .find(|v| v.options == options && v.path == path && v.resource.resource_type() == ty)
        {
            return v.resource.clone();
        }

        debug!("Caches {} at {:?}.", ty, path);
        bucket.push(CacheEntry {
            path,
            options,
            resource: resource.clone(),
        });

        resource
    }

    /// Creates a resource out of an in-memory value. Created resources have no path and are
    /// never cached.
    pub fn create(
        &self,
        ty: &'static ResourceType,
        value: &dyn Any,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
    ) -> Option<Arc<dyn Resource>> {
        match self.try_create(ty, value, options, flags) {
            Ok(v) => Some(v),
            Err(err) => {
                if !self.is_quiet(flags) {
                    warn!("{}", err);
                }

                None
            }
        }
    }

    pub fn create_as<T: ResourceKind, V: Any>(
        &self,
        value: &V,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
    ) -> Option<Arc<T>> {
        self.create(T::static_type(), value, options, flags)
            .and_then(resource::downcast)
    }

    /// Tries every creator registered for `ty` that accepts `value`, in order.
    pub fn try_create(
        &self,
        ty: &'static ResourceType,
        value: &dyn Any,
        options: Option<&dyn ResourceOptions>,
        flags: ResourceCacheFlags,
    ) -> Result<Arc<dyn Resource>> {
        let quiet = self.is_quiet(flags);
        let creators = self.creators(ty);

        let mut applicable = false;
        for creator in creators.iter().filter(|v| v.can_create(value)) {
            applicable = true;

            let ctx = CreatorContext {
                cache: self,
                options,
                flags,
            };

            match creator.create(&ctx, value) {
                Ok(v) if v.resource_type().is_derived_from(ty) => {
                    debug!("Creates {}.", v.resource_type());
                    return Ok(v);
                }
                Ok(v) => {
                    if !quiet {
                        error!(
                            "The creator of {} produced {}.",
                            creator.resource_type(),
                            v.resource_type()
                        );
                    }
                }
                Err(err) => {
                    if !quiet {
                        error!("The creator of {} failed: {}", creator.resource_type(), err);
                    }
                }
            }
        }

        if applicable {
            Err(Error::Unavailable {
                path: PathBuf::new(),
                ty: ty.name(),
            })
        } else {
            Err(Error::NoHandler {
                path: PathBuf::new(),
                ty: ty.name(),
            })
        }
    }

    /// Drops the cached entries at `path` whose type is `ty` or derived from `ty`. Holders
    /// outside the cache keep their resources alive. Returns true if anything was removed.
    pub fn unload<P: AsRef<Path>>(
        &self,
        path: P,
        ty: &'static ResourceType,
        options: Option<&dyn ResourceOptions>,
    ) -> bool {
        let path = vfs::canonicalize(path);
        let options = resource::options_hash(options);
        let key = cache_key(&path, options);

        let mut evicted = Vec::new();
        {
            let mut table = self.table.write().unwrap();
            if let Some(bucket) = table.get_mut(&key) {
                let mut i = 0;
                while i < bucket.len() {
                    let v = &bucket[i];
                    if v.options == options
                        && v.path == path
                        && v.resource.resource_type().is_derived_from(ty)
                    {
                        evicted.push(bucket.remove(i));
                    } else {
                        i += 1;
                    }
                }

                if bucket.is_empty() {
                    table.remove(&key);
                }
            }
        }

        for v in &evicted {
            debug!("Unloads {} at {:?}.", v.resource.resource_type(), v.path);
        }

        !evicted.is_empty()
    }

    /// Drops every entry that nobody outside the cache holds anymore, and returns how many
    /// were dropped. Resources freed by this pass are not revisited, so a dependency that
    /// became unused just now stays until the next call.
    pub fn unload_unused(&self) -> usize {
        let mut evicted = Vec::new();
        {
            let mut table = self.table.write().unwrap();
            table.retain(|_, bucket| {
                let mut i = 0;
                while i < bucket.len() {
                    if Arc::strong_count(&bucket[i].resource) == 1 {
                        evicted.push(bucket.remove(i));
                    } else {
                        i += 1;
                    }
                }

                !bucket.is_empty()
            });
        }

        for v in &evicted {
            debug!("Unloads unused {} at {:?}.", v.resource.resource_type(), v.path);
        }

        evicted.len()
    }

    /// Drops every entry of the cache table.
    pub fn unload_all(&self) {
        let table = mem::replace(&mut *self.table.write().unwrap(), FastHashMap::default());
        debug!(
            "Unloads all {} resources.",
            table.values().map(|v| v.len()).sum::<usize>()
        );
    }

    /// The number of cached resources.
    pub fn len(&self) -> usize {
        self.table.read().unwrap().values().map(|v| v.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lists the cached resources, ordered by path and type name.
    pub fn usage(&self) -> Vec<ResourceUsage> {
        let mut usage: Vec<_> = {
            let table = self.table.read().unwrap();
            table
                .values()
                .flat_map(|v| v.iter())
                .map(|v| ResourceUsage {
                    index: 0,
                    path: v.path.clone(),
                    type_name: v.resource.resource_type().name(),
                    strong_count: Arc::strong_count(&v.resource),
                    system_memory: v.resource.system_memory_use(),
                    video_memory: v.resource.video_memory_use(),
                })
                .collect()
        };

        usage.sort_by(|lhs, rhs| {
            (&lhs.path, lhs.type_name).cmp(&(&rhs.path, rhs.type_name))
        });

        for (i, v) in usage.iter_mut().enumerate() {
            v.index = i;
        }

        usage
    }

    /// Logs the cached resources at info level.
    pub fn dump_used(&self) {
        let usage = self.usage();
        info!("{} cached resources:", usage.len());

        for v in &usage {
            info!(
                "{:>4} {:?} {} refs: {} memory: {}B video: {}B",
                v.index, v.path, v.type_name, v.strong_count, v.system_memory, v.video_memory
            );
        }

        let memory = self.calc_memory_use();
        info!(
            "Total memory: {}B video: {}B, {} loads in flight.",
            memory.system,
            memory.video,
            self.inflight.len()
        );
    }

    /// Sums up the memory of every cached resource and of everything they use, counting
    /// each instance once.
    pub fn calc_memory_use(&self) -> MemoryUse {
        let mut stack: Vec<Arc<dyn Resource>> = {
            let table = self.table.read().unwrap();
            table
                .values()
                .flat_map(|v| v.iter())
                .map(|v| v.resource.clone())
                .collect()
        };

        let mut visited = FastHashSet::default();
        let mut memory = MemoryUse::default();

        while let Some(v) = stack.pop() {
            let addr = Arc::as_ptr(&v) as *const () as usize;
            if !visited.insert(addr) {
                continue;
            }

            memory.system += v.system_memory_use();
            memory.video += v.video_memory_use();
            v.used_resources(&mut stack);
        }

        memory
    }

    #[inline]
    fn is_quiet(&self, flags: ResourceCacheFlags) -> bool {
        self.params.quiet || flags.contains(ResourceCacheFlags::QUIET)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cache_key_mixes_options() {
        let path = Path::new("textures/crate.png");
        assert_eq!(cache_key(path, 0), cache_key(path, 0));
        assert!(cache_key(path, 0) != cache_key(path, 1));
        assert!(cache_key(path, 0) != cache_key(Path::new("textures/crate.bmp"), 0));
    }

    #[test]
    fn send_and_sync() {
        fn check<T: Send + Sync>() {}
        check::<ResourceCache>();
    }
}
