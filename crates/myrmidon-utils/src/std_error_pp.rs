use std::error::Error as StdError;
use std::fmt;

const DEFAULT_DEPTH_LIMIT: usize = 10;

/// Renders an error together with its chain of sources: `outer << inner << root`.
pub trait StdErrorPP: StdError + Sized {
    fn pp(&self) -> ErrorPP<'_> {
        let err: &dyn StdError = self;
        ErrorPP { err, depth_limit: DEFAULT_DEPTH_LIMIT }
    }
}
impl<E> StdErrorPP for E where E: StdError + Sized {}

#[derive(Debug, Clone, Copy)]
pub struct ErrorPP<'a> {
    err: &'a dyn StdError,
    depth_limit: usize,
}

impl<'a> ErrorPP<'a> {
    /// Same as [`StdErrorPP::pp`], for the unsized errors (e.g. the boxed ones).
    pub fn of(err: &'a dyn StdError) -> Self {
        Self { err, depth_limit: DEFAULT_DEPTH_LIMIT }
    }

    pub fn depth_limit(self, depth_limit: usize) -> Self {
        Self { depth_limit, ..self }
    }
}

impl<'a> fmt::Display for ErrorPP<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth_left = self.depth_limit;
        let mut err = self.err;
        write!(f, "{}", err)?;

        while let Some(next) = err.source() {
            if depth_left == 0 {
                write!(f, " << ...")?;
                break
            }
            depth_left -= 1;
            err = next;
            write!(f, " << {}", err)?;
        }
        Ok(())
    }
}
