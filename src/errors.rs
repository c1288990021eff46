use std::path::PathBuf;

/// Failures surfaced by the `ResourceCache`. None of them is fatal, every one of them
/// means "the requested resource is unavailable" with a different reason attached.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    IO(::std::io::Error),
    #[fail(display = "Could not open {:?} with any stream provider.", _0)]
    NotFound(PathBuf),
    #[fail(display = "No handler registered for {} (requested at {:?}).", ty, path)]
    NoHandler { path: PathBuf, ty: &'static str },
    #[fail(display = "Cyclic load of {} at {:?}.", ty, path)]
    Cyclic { path: PathBuf, ty: &'static str },
    #[fail(display = "Expects raw resource of type {} but got {}.", expected, found)]
    InvalidRawType {
        expected: &'static str,
        found: &'static str,
    },
    #[fail(display = "Failed to load {} from {:?}.", ty, path)]
    Unavailable { path: PathBuf, ty: &'static str },
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<::std::io::Error> for Error {
    fn from(err: ::std::io::Error) -> Self {
        Error::IO(err)
    }
}
