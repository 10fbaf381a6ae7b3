//! Decoder of the text record format, one record per line.
//!
//! Feature ids in a line are separated by whitespace. An empty line is an empty record.
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::data_source::DataSource;
use crate::errors::{AllPairsError, Result};
use crate::{FeatureId, RecordId};

/// A [`DataSource`] decoding the text record format.
pub struct TextDataSource<R> {
    reader: R,
    line: String,
    position: u64,
    next_rid: RecordId,
    offsets: Vec<u64>,
    read_end: u64,
}

impl TextDataSource<BufReader<File>> {
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

impl<R> TextDataSource<R>
where
    R: BufRead + Seek,
{
    /// Creates an instance reading from the current position of `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            position: 0,
            next_rid: 0,
            offsets: vec![],
            read_end: 0,
        }
    }
}

impl<R> DataSource for TextDataSource<R>
where
    R: BufRead + Seek,
{
    fn next_record(&mut self, features: &mut Vec<FeatureId>) -> Result<Option<RecordId>> {
        self.line.clear();
        let num_bytes = self.reader.read_line(&mut self.line).map_err(|e| {
            AllPairsError::data(format!("I/O failure at line {}: {e}", self.next_rid + 1))
        })?;
        if num_bytes == 0 {
            return Ok(None);
        }

        features.clear();
        for token in self.line.split_ascii_whitespace() {
            let feature = token.parse::<FeatureId>().map_err(|_| {
                AllPairsError::data(format!(
                    "Invalid feature id {token:?} at line {}.",
                    self.next_rid + 1
                ))
            })?;
            features.push(feature);
        }

        let rid = self.next_rid;
        if rid as usize == self.offsets.len() {
            self.offsets.push(self.position);
        }
        self.position += num_bytes as u64;
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

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_decode() {
        let text = "3\n1 4\n\n0 2  7\r\n";
        let mut data = TextDataSource::new(Cursor::new(text));
        let mut features = vec![];
        assert_eq!(data.next_record(&mut features).unwrap(), Some(0));
        assert_eq!(features, vec![3]);
        assert_eq!(data.next_record(&mut features).unwrap(), Some(1));
        assert_eq!(features, vec![1, 4]);
        assert_eq!(data.next_record(&mut features).unwrap(), Some(2));
        assert!(features.is_empty());
        assert_eq!(data.next_record(&mut features).unwrap(), Some(3));
        assert_eq!(features, vec![0, 2, 7]);
        assert_eq!(data.next_record(&mut features).unwrap(), None);
    }

    #[test]
    fn test_rewind() {
        let text = "1\n2 3\n4 5";
        let mut data = TextDataSource::new(Cursor::new(text));
        let mut features = vec![];
        while data.next_record(&mut features).unwrap().is_some() {}
        data.rewind(2).unwrap();
        assert_eq!(data.next_record(&mut features).unwrap(), Some(2));
        assert_eq!(features, vec![4, 5]);
        data.rewind(1).unwrap();
        assert_eq!(data.next_record(&mut features).unwrap(), Some(1));
        assert_eq!(features, vec![2, 3]);
        assert!(data.rewind(4).is_err());
    }

    #[test]
    fn test_invalid_feature() {
        let mut data = TextDataSource::new(Cursor::new("1 -2\n"));
        let mut features = vec![];
        assert!(data.next_record(&mut features).is_err());

        let mut data = TextDataSource::new(Cursor::new("1 a\n"));
        assert!(data.next_record(&mut features).is_err());
    }
}
