/*!
Files or stdin/stdout, selected by path with `-` meaning the standard stream
*/

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        match self {
            Input::Stdin => {
                let mut buffer = Vec::new();
                io::stdin().read_to_end(&mut buffer)?;
                Ok(buffer)
            }
            Input::File(path) => fs::read(path),
        }
    }

    pub fn read_to_string(&self) -> io::Result<String> {
        match self {
            Input::Stdin => io::read_to_string(io::stdin()),
            Input::File(path) => fs::read_to_string(path),
        }
    }
}

impl FromStr for Input {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "-" => Input::Stdin,
            path => Input::File(PathBuf::from(path)),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    File(PathBuf),
}

impl Output {
    /// A buffered writer over the destination; the caller flushes.
    pub fn writer(&self) -> io::Result<Box<dyn Write>> {
        Ok(match self {
            Output::Stdout => Box::new(BufWriter::new(io::stdout().lock())),
            Output::File(path) => Box::new(BufWriter::new(fs::File::create(path)?)),
        })
    }

    pub fn write_all(&self, data: &[u8]) -> io::Result<()> {
        let mut w = self.writer()?;
        w.write_all(data)?;
        w.flush()
    }
}

impl FromStr for Output {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" | "-" => Output::Stdout,
            path => Output::File(PathBuf::from(path)),
        })
    }
}
