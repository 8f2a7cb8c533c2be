use std::io::{self, Read, Write};

use common::misc::WriteU16Be;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("image has no origin word")]
    Empty,
    #[error("image ends in the middle of a word")]
    TruncatedWord,
}

/// A program image: the address to load at, followed by the words to place
/// there. On disk both are big-endian; in memory they are host order.
pub struct Image {
    pub origin: u16,
    pub words: Vec<u16>,
}

impl Image {
    pub fn read_from(reader: &mut impl Read) -> Result<Image, ImageError> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        if raw.len() % 2 != 0 {
            return Err(ImageError::TruncatedWord);
        }

        let mut words = raw
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        let Some(origin) = words.next() else {
            return Err(ImageError::Empty);
        };

        Ok(Image {
            origin,
            words: words.collect(),
        })
    }

    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        writer.write_u16_be(self.origin)?;
        for word in &self.words {
            writer.write_u16_be(*word)?;
        }
        Ok(())
    }
}
