use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// Readout source: a file, or stdin when the path is "-".
pub struct InputReader {
    reader: Box<dyn Read>,
    is_pipe: bool,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let input_path = input_path.as_ref();
        let is_pipe = input_path.as_os_str() == "-";

        let reader: Box<dyn Read> = if is_pipe {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(input_path)
                .with_context(|| format!("Failed to open {}", input_path.display()))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self { reader, is_pipe })
    }

    #[cfg(test)]
    fn from_reader(reader: impl Read + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            is_pipe: false,
        }
    }

    /// Returns the number of bytes read, 0 at EOF.
    pub fn read_chunk(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let bytes_read = self.reader.read(buffer)?;
        Ok(bytes_read)
    }

    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    /// Reads everything that is left.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Feeds the input to `callback` in chunks of at most `chunk_size` bytes
    /// until EOF or until the callback returns `Ok(false)`.
    pub fn process_chunks<F>(&mut self, chunk_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<bool>,
    {
        let mut buffer = vec![0u8; chunk_size.max(1)];

        loop {
            let bytes_read = self.read_chunk(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            if !callback(&buffer[..bytes_read])? {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn chunks_cover_input() -> Result<()> {
        let data: Vec<u8> = (0..=255).collect();
        let mut reader = InputReader::from_reader(Cursor::new(data.clone()));

        let mut seen = Vec::new();
        reader.process_chunks(100, |chunk| {
            assert!(chunk.len() <= 100);
            seen.extend_from_slice(chunk);
            Ok(true)
        })?;

        assert_eq!(seen, data);
        Ok(())
    }

    #[test]
    fn callback_can_stop() -> Result<()> {
        let mut reader = InputReader::from_reader(Cursor::new(vec![0u8; 64]));

        let mut calls = 0;
        reader.process_chunks(16, |_| {
            calls += 1;
            Ok(false)
        })?;

        assert_eq!(calls, 1);
        assert_eq!(reader.read_all()?.len(), 48);
        Ok(())
    }
}
