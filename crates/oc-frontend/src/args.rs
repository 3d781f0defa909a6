//! Relaunch argument blobs
//!
//! The OS loader takes a single byte buffer holding the new image's argv:
//! NUL-terminated strings back to back, target path first, with the total
//! length passed alongside. There is no per-entry length prefix.

use tracing::trace;

/// A provider of secondary relaunch arguments
pub trait ArgSource {
    /// Arguments to forward, or `None` if this source has nothing to offer
    fn resolve(&self) -> Option<Vec<String>>;
}

/// Arguments that fork a network-play session into the new image
#[derive(Debug, Clone, Default)]
pub struct NetplayForkArgs(pub Option<Vec<String>>);

impl ArgSource for NetplayForkArgs {
    fn resolve(&self) -> Option<Vec<String>> {
        self.0.as_ref().filter(|args| !args.is_empty()).cloned()
    }
}

/// The currently loaded content, forwarded as a single argument
#[derive(Debug, Clone, Default)]
pub struct ContentPath(pub Option<String>);

impl ArgSource for ContentPath {
    fn resolve(&self) -> Option<Vec<String>> {
        self.0
            .as_ref()
            .filter(|path| !path.is_empty())
            .map(|path| vec![path.clone()])
    }
}

/// Query `sources` in order and take the first one that yields arguments
pub fn resolve_args(sources: &[&dyn ArgSource]) -> Option<Vec<String>> {
    sources.iter().find_map(|source| source.resolve())
}

/// Bytes of `s` as the OS sees them: up to the first NUL, at most `max` long
fn c_bytes(s: &[u8], max: usize) -> &[u8] {
    let bounded = &s[..s.len().min(max)];
    match bounded.iter().position(|&b| b == 0) {
        Some(end) => &bounded[..end],
        None => bounded,
    }
}

/// A packed argument buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedArgs {
    bytes: Vec<u8>,
}

impl PackedArgs {
    /// Pack `path` followed by `args`.
    ///
    /// Secondary arguments longer than `max_arg_len` bytes are cut to that
    /// length. The total size is measured first and the buffer allocated
    /// exactly once.
    pub fn pack<S: AsRef<str>>(path: &str, args: &[S], max_arg_len: usize) -> Self {
        let path = c_bytes(path.as_bytes(), usize::MAX);
        let args: Vec<&[u8]> = args
            .iter()
            .map(|arg| c_bytes(arg.as_ref().as_bytes(), max_arg_len))
            .collect();

        let len = path.len() + 1 + args.iter().map(|arg| arg.len() + 1).sum::<usize>();

        let mut bytes = Vec::with_capacity(len);
        for entry in std::iter::once(path).chain(args) {
            bytes.extend_from_slice(entry);
            bytes.push(0);
        }
        debug_assert_eq!(bytes.len(), len);

        trace!("Packed {} relaunch argument bytes", len);
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Split an argument blob back into strings, keeping at most `max_count`.
///
/// A final entry missing its terminator runs to the end of the blob.
pub fn unpack(blob: &[u8], max_count: usize) -> Vec<String> {
    let mut argv = Vec::new();
    let mut rest = blob;

    while !rest.is_empty() && argv.len() < max_count {
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        argv.push(String::from_utf8_lossy(&rest[..end]).into_owned());
        rest = rest.get(end + 1..).unwrap_or(&[]);
    }

    argv
}
