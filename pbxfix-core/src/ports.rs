//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;

/// File-system read operations.
pub trait ReadPort {
    fn read_file(&self, path: &Utf8Path) -> anyhow::Result<Vec<u8>>;

    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("{path} is not UTF-8: {e}"))
    }
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
