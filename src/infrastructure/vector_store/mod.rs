mod flat;

pub use flat::{read_manifest, FlatIndex, CHUNKS_FILE, MANIFEST_FILE, VECTORS_FILE};
