//! Dead-letter sink for records whose retries were exhausted.
//!
//! Abandoned records are appended to a single local file, the only durable
//! artifact the producer writes. Each record is framed according to
//! [`DeadLetterFormat`]; the default length prefix keeps record boundaries
//! recoverable, which raw concatenation cannot.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::DeadLetterFormat;
use crate::error_handling::ProducerError;
use crate::record::Record;

const LENGTH_PREFIX_BYTES: usize = 4;

/// Append-only file of abandoned records.
#[derive(Debug)]
pub struct DeadLetterSink {
    path: PathBuf,
    format: DeadLetterFormat,
    // Serializes writers so frames from concurrent batches never interleave
    write_lock: Mutex<()>,
}

impl DeadLetterSink {
    /// Creates a sink appending to `path`; the file is opened on first write.
    pub fn new(path: impl Into<PathBuf>, format: DeadLetterFormat) -> Self {
        Self {
            path: path.into(),
            format,
            write_lock: Mutex::new(()),
        }
    }

    /// File the sink appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Framing of each written record.
    pub fn format(&self) -> DeadLetterFormat {
        self.format
    }

    /// Appends the data of every record, in order, one write per record.
    ///
    /// The file is opened in append mode for each call and synced before
    /// returning. Concurrent callers wait their turn asynchronously, so a
    /// slow disk holds up only the flushes that are dead-lettering.
    ///
    /// # Errors
    ///
    /// Returns `ProducerError::DeadLetter` if the file cannot be opened,
    /// written or synced. The records are lost in that case.
    pub async fn write_records(&self, records: &[Record]) -> Result<(), ProducerError> {
        if records.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        self.append(records).await.map_err(|source| {
            log::error!(
                "Failed to write {} records to dead-letter file {}: {}",
                records.len(),
                self.path.display(),
                source
            );
            ProducerError::DeadLetter {
                records: records.len(),
                source,
            }
        })
    }

    async fn append(&self, records: &[Record]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        for record in records {
            file.write_all(&frame(self.format, &record.data)?).await?;
        }
        file.flush().await?;
        file.sync_data().await
    }
}

fn frame(format: DeadLetterFormat, data: &[u8]) -> io::Result<Vec<u8>> {
    match format {
        DeadLetterFormat::LengthPrefixed => {
            let len = u32::try_from(data.len()).map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("record of {} bytes is too large to frame", data.len()),
                )
            })?;
            let mut framed = Vec::with_capacity(LENGTH_PREFIX_BYTES + data.len());
            framed.extend_from_slice(&len.to_be_bytes());
            framed.extend_from_slice(data);
            Ok(framed)
        }
        DeadLetterFormat::NewlineDelimited => {
            let mut framed = Vec::with_capacity(data.len() + 1);
            framed.extend_from_slice(data);
            framed.push(b'\n');
            Ok(framed)
        }
        DeadLetterFormat::Raw => Ok(data.to_vec()),
    }
}

/// Splits the contents of a length-prefixed dead-letter file into record payloads.
///
/// # Errors
///
/// Returns an `InvalidData` error if the input ends inside a frame.
pub fn parse_length_prefixed(mut bytes: &[u8]) -> io::Result<Vec<Vec<u8>>> {
    let mut records = Vec::new();
    while !bytes.is_empty() {
        if bytes.len() < LENGTH_PREFIX_BYTES {
            return Err(truncated(bytes.len()));
        }
        let (prefix, rest) = bytes.split_at(LENGTH_PREFIX_BYTES);
        let mut len_bytes = [0u8; LENGTH_PREFIX_BYTES];
        len_bytes.copy_from_slice(prefix);
        let len = u32::from_be_bytes(len_bytes) as usize;
        if rest.len() < len {
            return Err(truncated(rest.len()));
        }
        let (data, rest) = rest.split_at(len);
        records.push(data.to_vec());
        bytes = rest;
    }
    Ok(records)
}

fn truncated(remaining: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("dead-letter file ends inside a frame ({} trailing bytes)", remaining),
    )
}

/// Reads back the payloads stored in a length-prefixed dead-letter file.
///
/// # Errors
///
/// Returns `ProducerError::Io` if the file cannot be read or is truncated.
pub fn read_dead_letters(path: impl AsRef<Path>) -> Result<Vec<Vec<u8>>, ProducerError> {
    let bytes = std::fs::read(path)?;
    Ok(parse_length_prefixed(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn records(payloads: &[&[u8]]) -> Vec<Record> {
        payloads
            .iter()
            .map(|data| Record::new(data.to_vec(), Some("k")))
            .collect()
    }

    #[tokio::test]
    async fn test_length_prefixed_preserves_boundaries() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("failed.dlq");
        let sink = DeadLetterSink::new(&path, DeadLetterFormat::LengthPrefixed);

        sink.write_records(&records(&[b"first", b"", b"line\nbreak"]))
            .await
            .expect("write");
        sink.write_records(&records(&[b"second call"]))
            .await
            .expect("write");

        let stored = read_dead_letters(&path).expect("read");
        assert_eq!(
            stored,
            vec![
                b"first".to_vec(),
                Vec::new(),
                b"line\nbreak".to_vec(),
                b"second call".to_vec()
            ]
        );
    }

    #[tokio::test]
    async fn test_waiting_writer_does_not_block_the_runtime() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("failed.dlq");
        let sink = std::sync::Arc::new(DeadLetterSink::new(&path, DeadLetterFormat::LengthPrefixed));

        // Hold the writer lock so the spawned write has to wait for it
        let held = sink.write_lock.lock().await;
        let writer = {
            let sink = std::sync::Arc::clone(&sink);
            tokio::spawn(async move { sink.write_records(&records(&[b"late"])).await })
        };

        // The current-thread runtime keeps running other tasks meanwhile
        let ticks = tokio::spawn(async {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            10
        });
        assert_eq!(ticks.await.expect("ticker"), 10);
        assert!(!writer.is_finished());

        drop(held);
        writer.await.expect("join").expect("write");
        assert_eq!(read_dead_letters(&path).expect("read"), vec![b"late".to_vec()]);
    }

    #[tokio::test]
    async fn test_newline_format() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("failed.dlq");
        let sink = DeadLetterSink::new(&path, DeadLetterFormat::NewlineDelimited);
        sink.write_records(&records(&[b"a", b"b"]))
            .await
            .expect("write");
        assert_eq!(std::fs::read(&path).expect("read"), b"a\nb\n".to_vec());
    }

    #[tokio::test]
    async fn test_raw_format_concatenates() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("failed.dlq");
        let sink = DeadLetterSink::new(&path, DeadLetterFormat::Raw);
        sink.write_records(&records(&[b"ab", b"cd"]))
            .await
            .expect("write");
        sink.write_records(&records(&[b"ef"])).await.expect("write");
        assert_eq!(std::fs::read(&path).expect("read"), b"abcdef".to_vec());
    }

    #[tokio::test]
    async fn test_empty_write_does_not_create_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("failed.dlq");
        let sink = DeadLetterSink::new(&path, DeadLetterFormat::LengthPrefixed);
        sink.write_records(&[]).await.expect("write");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unwritable_path_is_reported() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("failed.dlq");
        let sink = DeadLetterSink::new(&path, DeadLetterFormat::LengthPrefixed);
        let err = sink
            .write_records(&records(&[b"a", b"b"]))
            .await
            .expect_err("directory does not exist");
        assert!(matches!(err, ProducerError::DeadLetter { records: 2, .. }));
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let mut bytes = 5u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        let err = parse_length_prefixed(&bytes).expect_err("truncated");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err = parse_length_prefixed(&[0, 0]).expect_err("short prefix");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_do_not_interleave() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("failed.dlq");
        let sink = std::sync::Arc::new(DeadLetterSink::new(&path, DeadLetterFormat::LengthPrefixed));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sink = std::sync::Arc::clone(&sink);
                tokio::spawn(async move {
                    let batch: Vec<Record> = (0..50)
                        .map(|i| Record::new(format!("{}-{}", t, i).into_bytes(), Some("k")))
                        .collect();
                    sink.write_records(&batch).await.expect("write");
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("writer panicked");
        }

        let stored = read_dead_letters(&path).expect("read");
        assert_eq!(stored.len(), 200);
        for t in 0..4 {
            let mine: Vec<String> = stored
                .iter()
                .map(|data| String::from_utf8(data.clone()).expect("utf8"))
                .filter(|text| text.starts_with(&format!("{}-", t)))
                .collect();
            let expected: Vec<String> = (0..50).map(|i| format!("{}-{}", t, i)).collect();
            assert_eq!(mine, expected);
        }
    }
}
