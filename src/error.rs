use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Falhas ao interpretar bytes recebidos da rede.
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("pacote malformado: {len} bytes, mínimo {needed}")]
    Malformed { len: usize, needed: usize },

    #[error("datagrama não é IPv4 (versão {0})")]
    NotIpv4(u8),

    #[error("IHL inválido: {0} palavras")]
    BadHeaderLength(u8),
}

/// Falhas ao abrir o socket RAW.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("sem privilégio para abrir socket RAW (root ou CAP_NET_RAW)")]
    Privilege(#[source] io::Error),

    #[error("falha ao criar socket RAW")]
    Create(#[source] io::Error),
}

/// Falhas durante uma execução do cliente.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("falha ao enviar pacote seq={seq}")]
    Send {
        seq: u16,
        #[source]
        source: io::Error,
    },

    #[error("falha ao receber resposta")]
    Receive(#[source] io::Error),

    #[error("nenhuma resposta em {0:?}")]
    NoResponse(Duration),
}

/// Argumentos de linha de comando inválidos ou payload ilegível.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("faltou o valor para {0}")]
    MissingValue(&'static str),

    #[error("opção desconhecida: {0}")]
    UnknownFlag(String),

    #[error("endereço IP inválido: {0}")]
    InvalidTarget(String),

    #[error("valor inválido para -w: {0}")]
    InvalidTimeout(String),

    #[error("arquivo '{}' não encontrado ou ilegível", path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
