bitflags! {
    /// Per-request behaviour switches of the `ResourceCache`.
    #[derive(Default)]
    pub struct ResourceCacheFlags: u32 {
        /// Suppresses the failure logs of this request and of every nested request made
        /// with the same flags.
        const QUIET = 1 << 0;
        /// Tries every loader of the requested type regardless of the path extension.
        const IGNORE_EXTENSION = 1 << 1;
    }
}
