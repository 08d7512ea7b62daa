mod delimited;
mod docx;

pub use delimited::DelimitedReader;
pub use docx::DocxReader;
