use std::fmt::{self, Debug, Formatter};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// A console sink that replies are echoed to.
///
/// The echo is cosmetic, write failures are ignored. Clones share the same
/// sink.
#[derive(Clone)]
pub struct Echo {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Echo {
    /// Echoes to the standard output.
    #[inline]
    pub fn stdout() -> Self {
        Self::to_writer(io::stdout())
    }

    /// Echoes to an arbitrary writer.
    pub fn to_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Writes a fragment as is and flushes, so it shows up immediately.
    pub(crate) fn fragment(&self, text: &str) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(text.as_bytes()).ok();
        sink.flush().ok();
    }

    /// Writes a whole line.
    pub(crate) fn line(&self, text: &str) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(sink, "{text}").ok();
        sink.flush().ok();
    }
}

impl Debug for Echo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Echo").finish_non_exhaustive()
    }
}
