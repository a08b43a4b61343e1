// Document layer: PDF text extraction, chunking and the ephemeral similarity index.
// Nothing here outlives a single request.

pub mod chunking;
pub mod extract;
pub mod index;
