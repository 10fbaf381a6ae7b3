//! Decoder of the binary record format.
//!
//! A file is a sequence of records, each encoded in little endian as
//!
//! * `u32` stored id,
//! * `u32` number of features `n`,
//! * `n` feature ids of `u32`.
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::data_source::DataSource;
use crate::errors::{AllPairsError, Result};
use crate::{FeatureId, RecordId};

const HEADER_BYTES: u64 = 8;
const CHUNK_FEATURES: usize = 1 << 16;

/// A [`DataSource`] decoding the binary record format.
///
/// The stored ids in the file are kept aside; record ids are the arrival ordinals.
pub struct BinaryDataSource<R> {
    reader: R,
    position: u64,
    next_rid: RecordId,
    // Byte offsets and stored ids of the records read so far, indexed by record id.
    offsets: Vec<u64>,
    stored_ids: Vec<u32>,
    // Byte offset just after the furthest record read so far.
    read_end: u64,
}

impl BinaryDataSource<BufReader<File>> {
    /// Opens the file at `path`.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AllPairsError::data(format!("Could not open {}: {e}", path.display()))
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R> BinaryDataSource<R>
where
    R: Read + Seek,
{
    /// Creates an instance reading from the current position of `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
            next_rid: 0,
            offsets: vec![],
            stored_ids: vec![],
            read_end: 0,
        }
    }

    /// Reads through the rest of the file and gets the ids stored in it, indexed by record id.
    /// The source is rewound to the first record afterward.
    pub fn stored_ids(&mut self) -> Result<Vec<u32>> {
        let mut features = vec![];
        while self.next_record(&mut features)?.is_some() {}
        self.rewind(0)?;
        Ok(self.stored_ids.clone())
    }

    // Reads the stored id, or returns `None` at a clean end of the file.
    fn read_stored_id(&mut self) -> Result<Option<u32>> {
        let mut buf = [0; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(self.io_error(e)),
            }
        }
        match filled {
            0 => Ok(None),
            4 => Ok(Some(u32::from_le_bytes(buf))),
            _ => Err(self.truncated()),
        }
    }

    fn io_error(&self, e: std::io::Error) -> AllPairsError {
        if e.kind() == ErrorKind::UnexpectedEof {
            self.truncated()
        } else {
            AllPairsError::data(format!(
                "I/O failure at byte {} (record {}): {e}",
                self.position, self.next_rid
            ))
        }
    }

    fn truncated(&self) -> AllPairsError {
        AllPairsError::data(format!(
            "Truncated record {} at byte {}.",
            self.next_rid, self.position
        ))
    }
}

impl<R> DataSource for BinaryDataSource<R>
where
    R: Read + Seek,
{
    fn next_record(&mut self, features: &mut Vec<FeatureId>) -> Result<Option<RecordId>> {
        let stored_id = match self.read_stored_id()? {
            Some(id) => id,
            None => return Ok(None),
        };
        let len = self
            .reader
            .read_u32::<LittleEndian>()
            .map_err(|e| self.io_error(e))? as usize;
        // The length comes from the file, so the buffer grows only as features arrive.
        features.clear();
        while features.len() < len {
            let start = features.len();
            features.resize(start + (len - start).min(CHUNK_FEATURES), 0);
            self.reader
                .read_u32_into::<LittleEndian>(&mut features[start..])
                .map_err(|e| self.io_error(e))?;
        }

        let rid = self.next_rid;
        if rid as usize == self.offsets.len() {
            self.offsets.push(self.position);
            self.stored_ids.push(stored_id);
        }
        self.position += HEADER_BYTES + 4 * len as u64;
        self.next_rid += 1;
        if self.next_rid as usize == self.offsets.len() {
            self.read_end = self.position;
        }
        Ok(Some(rid))
    }

    fn rewind(&mut self, rid: RecordId) -> Result<()> {
        let offset = match self.offsets.get(rid as usize) {
            Some(&offset) => offset,
            None if rid as usize == self.offsets.len() => self.read_end,
            None => {
                return Err(AllPairsError::data(format!(
                    "Cannot rewind to record {rid} which has not been read yet."
                )))
            }
        };
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| AllPairsError::data(format!("Could not seek to byte {offset}: {e}")))?;
        self.position = offset;
        self.next_rid = rid;
        Ok(())
    }
}

/// Writes a record in the binary record format.
pub fn write_record<W>(wtr: &mut W, stored_id: u32, features: &[FeatureId]) -> std::io::Result<()>
where
    W: Write,
{
    wtr.write_u32::<LittleEndian>(stored_id)?;
    wtr.write_u32::<LittleEndian>(features.len() as u32)?;
    for &f in features {
        wtr.write_u32::<LittleEndian>(f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn encode(records: &[(u32, Vec<FeatureId>)]) -> Vec<u8> {
        let mut buf = vec![];
        for (id, features) in records {
            write_record(&mut buf, *id, features).unwrap();
        }
        buf
    }

    #[test]
    fn test_decode() {
        let buf = encode(&[(42, vec![1, 2]), (7, vec![0, 3, 9])]);
        let mut data = BinaryDataSource::new(Cursor::new(buf));
        let mut features = vec![];
        assert_eq!(data.next_record(&mut features).unwrap(), Some(0));
        assert_eq!(features, vec![1, 2]);
        assert_eq!(data.next_record(&mut features).unwrap(), Some(1));
        assert_eq!(features, vec![0, 3, 9]);
        assert_eq!(data.next_record(&mut features).unwrap(), None);
    }

    #[test]
    fn test_stored_ids() {
        let buf = encode(&[(42, vec![1, 2]), (7, vec![0, 3, 9]), (9, vec![])]);
        let mut data = BinaryDataSource::new(Cursor::new(buf));
        let mut features = vec![];
        assert_eq!(data.next_record(&mut features).unwrap(), Some(0));
        assert_eq!(data.stored_ids().unwrap(), vec![42, 7, 9]);
        assert_eq!(data.next_record(&mut features).unwrap(), Some(0));
        assert_eq!(features, vec![1, 2]);
    }

    #[test]
    fn test_rewind() {
        let buf = encode(&[(0, vec![1]), (1, vec![2, 3]), (2, vec![4, 5])]);
        let mut data = BinaryDataSource::new(Cursor::new(buf));
        let mut features = vec![];
        while data.next_record(&mut features).unwrap().is_some() {}

        data.rewind(1).unwrap();
        assert_eq!(data.next_record(&mut features).unwrap(), Some(1));
        assert_eq!(features, vec![2, 3]);
        assert_eq!(data.next_record(&mut features).unwrap(), Some(2));
        assert_eq!(data.next_record(&mut features).unwrap(), None);

        data.rewind(0).unwrap();
        assert_eq!(data.next_record(&mut features).unwrap(), Some(0));
        assert_eq!(features, vec![1]);
    }

    #[test]
    fn test_rewind_to_unread() {
        let buf = encode(&[(0, vec![1]), (1, vec![2, 3])]);
        let mut data = BinaryDataSource::new(Cursor::new(buf));
        let mut features = vec![];
        data.next_record(&mut features).unwrap();
        assert!(data.rewind(1).is_ok());
        assert_eq!(data.next_record(&mut features).unwrap(), Some(1));
        assert!(data.rewind(5).is_err());
    }

    #[test]
    fn test_truncated() {
        let mut buf = encode(&[(0, vec![1, 2, 3])]);
        buf.truncate(buf.len() - 2);
        let mut data = BinaryDataSource::new(Cursor::new(buf));
        let mut features = vec![];
        assert!(data.next_record(&mut features).is_err());
    }

    #[test]
    fn test_truncated_header() {
        let mut buf = encode(&[(0, vec![1])]);
        buf.extend_from_slice(&[1, 0]);
        let mut data = BinaryDataSource::new(Cursor::new(buf));
        let mut features = vec![];
        assert_eq!(data.next_record(&mut features).unwrap(), Some(0));
        assert!(data.next_record(&mut features).is_err());
    }

    #[test]
    fn test_corrupted_length() {
        let mut buf = vec![];
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(u32::MAX).unwrap();
        buf.write_u32::<LittleEndian>(1).unwrap();
        let mut data = BinaryDataSource::new(Cursor::new(buf));
        let mut features = vec![];
        let result = data.next_record(&mut features);
        assert!(matches!(result, Err(AllPairsError::Data(_))));
        assert!(features.len() <= CHUNK_FEATURES);
    }

    #[test]
    fn test_record_longer_than_chunk() {
        let record: Vec<FeatureId> = (0..CHUNK_FEATURES as u32 * 2 + 3).collect();
        let buf = encode(&[(5, record.clone())]);
        let mut data = BinaryDataSource::new(Cursor::new(buf));
        let mut features = vec![];
        assert_eq!(data.next_record(&mut features).unwrap(), Some(0));
        assert_eq!(features, record);
        assert_eq!(data.next_record(&mut features).unwrap(), None);
    }
}
