//! Sequential/random-access reader over one file.
//!
//! Open validates both magic markers; the footer is parsed once on first
//! request. Chunk headers, page headers and raw page bodies are fetched by
//! absolute offset. The reader owns its seekable handle; series readers
//! share it single-threaded behind `Rc<RefCell<…>>`.

use crate::error::{FormatError, Result};
use crate::file::header::{ChunkHeader, PageHeader};
use crate::file::metadata::FileMetaData;
use crate::io::{ByteReader, FormatRead};
use crate::{TsDataType, MAGIC};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

// trailing magic + 4-byte footer size
const TAIL_SIZE: u64 = MAGIC.len() as u64 + 4;

pub struct TsFileSequenceReader {
    file: File,
    file_size: u64,
    metadata: Option<FileMetaData>,
}

impl FormatRead for TsFileSequenceReader {
    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.file.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_exact_bytes(&mut self, n: usize, _reading: &'static str) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl TsFileSequenceReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut reader = Self {
            file,
            file_size,
            metadata: None,
        };

        if file_size < (MAGIC.len() as u64) * 2 + 4 {
            return Err(FormatError::NoFooter(file_size).into());
        }
        reader.file.seek(SeekFrom::Start(0))?;
        let head = reader.read_exact_bytes(MAGIC.len(), "head magic")?;
        if head != MAGIC {
            return Err(FormatError::BadMagic { position: "head" }.into());
        }
        reader
            .file
            .seek(SeekFrom::Start(file_size - MAGIC.len() as u64))?;
        let tail = reader.read_exact_bytes(MAGIC.len(), "tail magic")?;
        if tail != MAGIC {
            return Err(FormatError::BadMagic { position: "tail" }.into());
        }

        Ok(reader)
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Parse the footer. Idempotent; later calls return the cached index.
    pub fn read_file_metadata(&mut self) -> Result<&FileMetaData> {
        if self.metadata.is_none() {
            self.file
                .seek(SeekFrom::Start(self.file_size - TAIL_SIZE))?;
            let footer_size = self.read_int()?;
            if footer_size < 0 || footer_size as u64 + TAIL_SIZE + MAGIC.len() as u64 > self.file_size
            {
                return Err(FormatError::NoFooter(self.file_size).into());
            }
            let footer_start = self.file_size - TAIL_SIZE - footer_size as u64;
            self.file.seek(SeekFrom::Start(footer_start))?;
            let footer_bytes = self.read_exact_bytes(footer_size as usize, "footer")?;

            let mut reader = ByteReader::new(footer_bytes);
            self.metadata = Some(FileMetaData::deserialize(&mut reader)?);
        }
        Ok(self.metadata.as_ref().expect("parsed above"))
    }

    /// Position at `offset` and parse one chunk header; the cursor is left
    /// at the first page header.
    pub fn read_chunk_header_at(&mut self, offset: u64) -> Result<ChunkHeader> {
        self.file.seek(SeekFrom::Start(offset))?;
        ChunkHeader::deserialize(self)
    }

    /// Parse one page header at the current position.
    pub fn read_page_header(&mut self, data_type: TsDataType) -> Result<PageHeader> {
        PageHeader::deserialize(self, data_type)
    }

    /// Fetch one raw page body.
    pub fn read_raw(&mut self, offset: u64, size: usize) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.read_exact_bytes(size, "page body")
    }

    pub fn pos(&mut self) -> Result<u64> {
        Ok(self.file.stream_position()?)
    }

    pub fn skip(&mut self, bytes: u64) -> Result<()> {
        self.file.seek(SeekFrom::Current(bytes as i64))?;
        Ok(())
    }
}
