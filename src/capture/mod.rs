//! Mail capture: decoding a received message and publishing it as local
//! HTML documents.

pub mod artifact;
pub mod attachments;
pub mod decoder;
pub mod error;
pub mod index;
pub mod message;
pub mod pipeline;
pub mod publisher;
pub mod session;
pub mod viewer;

pub use artifact::{ArtifactStore, DocumentKind};
pub use attachments::{AttachmentRecord, materialize};
pub use decoder::{QuotedPrintableReader, decode_body};
pub use error::CaptureError;
pub use index::{IndexOptions, render_index};
pub use message::{Attachment, ParsedMessage};
pub use pipeline::{CapturePipeline, CaptureReport};
pub use publisher::Publisher;
pub use session::{CaptureBackend, CaptureSession};
pub use viewer::{LogViewer, SystemViewer, Viewer};
