use std::fmt;

use thiserror::Error;

/// Why one reader declined a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reader: &'static str,
    pub reason: String,
}

/// Every rejection collected while trying the readers, in the order tried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rejections(pub Vec<Rejection>);

impl Rejections {
    pub fn readers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|rejection| rejection.reader)
    }
}

impl fmt::Display for Rejections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no readers configured");
        }
        for (idx, rejection) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} declined ({})", rejection.reader, rejection.reason)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{reader} format mismatch: {reason}")]
    FormatMismatch {
        reader: &'static str,
        reason: String,
    },

    #[error("{reader} archive error: {source}")]
    Zip {
        reader: &'static str,
        #[source]
        source: ::zip::result::ZipError,
    },

    #[error("{reader} document part '{part}' is missing")]
    MissingPart {
        reader: &'static str,
        part: &'static str,
    },

    #[error("{reader} XML error at byte {position}: {message}")]
    Xml {
        reader: &'static str,
        position: u64,
        message: String,
    },

    #[error("{reader} CSV error: {source}")]
    Csv {
        reader: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error reading document: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognised document: {0}")]
    UnknownFormat(Rejections),
}
