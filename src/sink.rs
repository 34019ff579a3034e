//! Registro em disco das mensagens recebidas, um arquivo por IP de origem.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Destino das mensagens decodificadas pelo servidor.
pub trait MessageSink {
    fn deliver(&mut self, source: IpAddr, text: &str) -> io::Result<()>;
}

/// `client_10_0_0_5.txt` para 10.0.0.5.
pub fn log_file_name(source: IpAddr) -> String {
    format!("client_{}.txt", source.to_string().replace('.', "_"))
}

/// Anexa cada mensagem como uma linha em `<dir>/client_<ip>.txt`.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSink { dir: dir.into() }
    }

    pub fn path_for(&self, source: IpAddr) -> PathBuf {
        self.dir.join(log_file_name(source))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MessageSink for FileSink {
    fn deliver(&mut self, source: IpAddr, text: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(source);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{text}")?;
        log::debug!("mensagem de {source} anexada a {}", path.display());
        Ok(())
    }
}
